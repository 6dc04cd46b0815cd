/**
 * TUNNELWATCH - Point d'entrée du daemon
 *
 * RÔLE : Bootstrap complet : .env, config, session MQTT (last-will),
 * capture du roster initial, puis boucle du scheduler jusqu'à l'arrêt.
 * Seul un échec de démarrage (config illisible, ou broker injoignable à
 * la première connexion) sort en code non nul ; tout le reste est loggé
 * et retenté au cycle suivant.
 */
use tokio::sync::mpsc;
use tunnelwatch::backend::PivpnSource;
use tunnelwatch::scheduler::{Monitor, SchedulerEvent};
use tunnelwatch::{config, mqtt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok(); // ok si .env n'existe pas

    let cfg = match config::load_config().await {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[tunnelwatch] startup failed: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "[tunnelwatch] backend {:?}, broker {}:{}, polling every {}min",
        cfg.vpn.backend, cfg.mqtt.host, cfg.mqtt.port, cfg.update_minutes
    );

    let (client, eventloop) = mqtt::create_mqtt_client(&cfg);
    let (events, rx) = mpsc::unbounded_channel();
    mqtt::spawn_event_loop(eventloop, events.clone());

    // Ctrl-C → arrêt propre : timer annulé, cycle en vol mené à terme
    let shutdown = events.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("[tunnelwatch] interrupt received");
            let _ = shutdown.send(SchedulerEvent::Shutdown);
        }
    });

    let source = PivpnSource::from_config(&cfg);
    let mut monitor = Monitor::new(cfg, source, client);
    monitor.bootstrap().await;
    monitor.run(rx).await;
    if monitor.startup_failed() {
        eprintln!("[tunnelwatch] could not establish initial broker connection");
        std::process::exit(1);
    }
    println!("[tunnelwatch] stopped");
}
