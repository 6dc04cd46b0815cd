/**
 * SCHEDULER - Boucle de réconciliation périodique du roster
 *
 * RÔLE : Une seule task possède le dernier roster connu (single writer) et
 * sérialise les deux chemins d'écriture : le tick périodique et le callback
 * de connexion au broker, reçus par le même canal d'événements. Le timer
 * est un deadline one-shot réarmé seulement quand le cycle courant est
 * terminé : deux cycles ne peuvent pas se chevaucher par construction,
 * quelle que soit la durée des sous-processus ou des publishes.
 *
 * Machine : Idle (pas de timer) → Armed (deadline posé) → Running (cycle en
 * cours) → Armed. L'arrêt ramène en Idle sans réarmer ; un cycle en vol va
 * jusqu'au bout.
 */
use crate::backend::RosterSource;
use crate::config::MonitorConfig;
use crate::models::Roster;
use crate::mqtt::MessageBus;
use crate::{attributes, diff, discovery, parser};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// ConnAck du broker (connexion initiale ou reconnexion).
    BusConnected,
    /// La toute première connexion au broker a échoué : fatal, le process
    /// doit sortir en code non nul.
    StartupFailed,
    /// Arrêt demandé : timer annulé, pas de réarmement.
    Shutdown,
}

pub struct Monitor<S: RosterSource, C: MessageBus> {
    cfg: MonitorConfig,
    source: S,
    bus: C,
    roster: Roster,
    state: SchedulerState,
    startup_failed: bool,
}

impl<S: RosterSource, C: MessageBus> Monitor<S, C> {
    pub fn new(cfg: MonitorConfig, source: S, bus: C) -> Self {
        Self {
            cfg,
            source,
            bus,
            roster: Vec::new(),
            state: SchedulerState::Idle,
            startup_failed: false,
        }
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Vrai si la boucle s'est arrêtée faute de première connexion au
    /// broker ; le main sort alors en code non nul.
    pub fn startup_failed(&self) -> bool {
        self.startup_failed
    }

    /// Capture initiale du roster, avant que le premier ConnAck puisse
    /// arriver : la passe de discovery de connexion a ainsi déjà de quoi
    /// enregistrer les clients connus.
    pub async fn bootstrap(&mut self) {
        let raw = self.source.list_clients().await;
        self.roster = parser::parse_roster(&raw, self.cfg.vpn.backend.roster_format());
        println!(
            "[scheduler] initial roster: {} clients {:?}",
            self.roster.len(),
            self.roster
        );
    }

    /// Passe de (re)connexion : réenregistre tous les clients connus puis
    /// publie la disponibilité globale. Aucun attribut ici — les consommateurs
    /// doivent toujours voir un enregistrement avant des données qui le
    /// référencent, et les attributs suivront au prochain cycle.
    pub async fn announce(&mut self) {
        println!(
            "[scheduler] broker (re)connected, discovery pass for {} clients",
            self.roster.len()
        );
        for client in self.roster.clone() {
            if let Err(e) = discovery::register(&self.bus, &self.cfg, &client).await {
                eprintln!("[scheduler] register {client} failed: {e:?}");
            }
        }
        if let Err(e) = discovery::publish_availability(&self.bus, &self.cfg).await {
            eprintln!("[scheduler] availability publish failed: {e:?}");
        }
    }

    /// Un cycle complet : capture → diff → enregistrements/retraits → attributs
    /// et état pour tout le roster courant → le nouveau roster devient la
    /// référence. Les échecs par client sont loggés et n'interrompent pas le
    /// reste du cycle.
    pub async fn run_cycle(&mut self) {
        let raw = self.source.list_clients().await;
        let current = parser::parse_roster(&raw, self.cfg.vpn.backend.roster_format());
        let delta = diff::diff(&self.roster, &current);

        if delta.is_empty() {
            println!("[scheduler] roster unchanged ({} clients)", current.len());
        } else {
            println!(
                "[scheduler] roster changed: +{:?} -{:?}",
                delta.added, delta.removed
            );
        }

        // Les retraits/enregistrements précèdent toujours les attributs.
        for client in &delta.added {
            if let Err(e) = discovery::register(&self.bus, &self.cfg, client).await {
                eprintln!("[scheduler] register {client} failed: {e:?}");
            }
        }
        for client in &delta.removed {
            if let Err(e) = discovery::retract(&self.bus, &self.cfg, client).await {
                eprintln!("[scheduler] retract {client} failed: {e:?}");
            }
        }

        for client in &current {
            let raw = self.source.client_detail(client).await;
            let record = parser::parse_record(&raw, client);
            if let Err(e) = attributes::publish_client(&self.bus, &self.cfg, &record).await {
                eprintln!("[scheduler] publish for {client} failed: {e:?}");
            }
        }

        self.roster = current;
    }

    /// Boucle principale. Tourne jusqu'à Shutdown (ou fermeture du canal).
    pub async fn run(&mut self, mut events: UnboundedReceiver<SchedulerEvent>) {
        let period = Duration::from_secs(self.cfg.update_minutes * 60);
        self.state = SchedulerState::Armed;
        let mut deadline = Instant::now() + period;

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    self.state = SchedulerState::Running;
                    self.run_cycle().await;
                    // réarmement inconditionnel : un backend en panne sur un
                    // cycle n'arrête jamais le polling
                    self.state = SchedulerState::Armed;
                    deadline = Instant::now() + period;
                }
                event = events.recv() => match event {
                    Some(SchedulerEvent::BusConnected) => self.announce().await,
                    Some(SchedulerEvent::StartupFailed) => {
                        eprintln!("[scheduler] no initial broker connection, giving up");
                        self.startup_failed = true;
                        self.state = SchedulerState::Idle;
                        break;
                    }
                    Some(SchedulerEvent::Shutdown) | None => {
                        println!("[scheduler] shutdown, timer disarmed");
                        self.state = SchedulerState::Idle;
                        break;
                    }
                }
            }
        }
    }
}
