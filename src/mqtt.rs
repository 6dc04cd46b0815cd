use crate::config::MonitorConfig;
use crate::discovery::PAYLOAD_NOT_AVAILABLE;
use crate::scheduler::SchedulerEvent;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, QoS};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;

/// Couture entre les publishers et le transport, pour pouvoir brancher le
/// client rumqttc en prod et un enregistreur en test.
#[allow(async_fn_in_trait)]
pub trait MessageBus {
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> anyhow::Result<()>;
}

impl MessageBus for AsyncClient {
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> anyhow::Result<()> {
        AsyncClient::publish(self, topic, qos, retain, payload).await?;
        Ok(())
    }
}

/// Options de session : identifiants, keep-alive, et last-will retained sur
/// le topic de disponibilité globale pour qu'une déconnexion sale soit
/// visible côté hub. Le payload du will est le même que celui annoncé dans
/// les documents de discovery.
pub fn build_mqtt_options(cfg: &MonitorConfig) -> MqttOptions {
    let mut opts = MqttOptions::new(
        cfg.mqtt.client_id.clone(),
        cfg.mqtt.host.clone(),
        cfg.mqtt.port,
    );
    opts.set_keep_alive(std::time::Duration::from_secs(15));
    if let (Some(user), Some(password)) = (&cfg.mqtt.username, &cfg.mqtt.password) {
        opts.set_credentials(user.clone(), password.clone());
    }
    opts.set_last_will(LastWill::new(
        cfg.availability_topic(),
        PAYLOAD_NOT_AVAILABLE,
        QoS::AtLeastOnce,
        true,
    ));
    opts
}

pub fn create_mqtt_client(cfg: &MonitorConfig) -> (AsyncClient, EventLoop) {
    AsyncClient::new(build_mqtt_options(cfg), 10)
}

/// Boucle réseau rumqttc sur sa propre task. Chaque ConnAck (connexion
/// initiale comme reconnexions) est transmis au scheduler, qui rejoue la
/// passe de discovery complète.
///
/// Tant qu'aucun ConnAck n'a été vu, une erreur transport est un échec de
/// démarrage : broker injoignable ou mal configuré, le daemon doit sortir
/// en code non nul plutôt que retenter en silence. Une fois la première
/// connexion établie, les erreurs sont retentées indéfiniment (2s de pause,
/// le poll suivant recompose la connexion).
pub fn spawn_event_loop(mut eventloop: EventLoop, events: UnboundedSender<SchedulerEvent>) {
    task::spawn(async move {
        let mut connected_once = false;
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    println!("[mqtt] connected to broker");
                    connected_once = true;
                    if events.send(SchedulerEvent::BusConnected).is_err() {
                        break; // scheduler arrêté
                    }
                }
                Ok(_) => {}
                Err(e) if !connected_once => {
                    eprintln!("[mqtt] cannot establish initial connection: {e:?}");
                    let _ = events.send(SchedulerEvent::StartupFailed);
                    break;
                }
                Err(e) => {
                    eprintln!("[mqtt] transport error: {e:?}");
                    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                }
            }
        }
    });
}
