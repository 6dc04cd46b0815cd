use crate::config::MonitorConfig;
use crate::models::ClientRecord;
use crate::mqtt::MessageBus;
use anyhow::Result;
use rumqttc::QoS;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Publie les deux messages non-retained d'un client : le document
/// d'attributs JSON puis la chaîne d'état. Appelé pour chaque client du
/// roster à chaque cycle, sans suppression des valeurs inchangées ; un
/// enregistrement partiel est publié best-effort plutôt qu'ignoré, pour
/// qu'une valeur périmée ne survive jamais silencieusement côté hub.
pub async fn publish_client<C: MessageBus>(
    bus: &C,
    cfg: &MonitorConfig,
    record: &ClientRecord,
) -> Result<()> {
    let ts = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    let attributes = serde_json::json!({
        "client": record.client,
        "remote_ip": record.remote_ip,
        "virtual_ip": record.virtual_ip,
        "received": record.received,
        "sent": record.sent,
        "seen": record.seen,
        "ts": ts,
    });

    bus.publish(
        &cfg.attributes_topic(&record.client),
        QoS::AtLeastOnce,
        false,
        serde_json::to_vec(&attributes)?,
    )
    .await?;

    bus.publish(
        &cfg.state_topic(&record.client),
        QoS::AtLeastOnce,
        false,
        record.state_string().into_bytes(),
    )
    .await
}
