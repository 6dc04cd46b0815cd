/**
 * DISCOVERY - Enregistrement/retrait des entités côté hub domotique
 *
 * RÔLE : Documents de discovery retained par client (un subscriber tardif,
 * typiquement un hub qui redémarre, les reçoit sans publication live), et
 * disponibilité globale retained sur <state_prefix>status.
 */
use crate::config::MonitorConfig;
use crate::models::{DeviceInfo, DiscoveryPayload};
use crate::mqtt::MessageBus;
use anyhow::Result;
use rumqttc::QoS;

pub const PAYLOAD_AVAILABLE: &str = "online";
pub const PAYLOAD_NOT_AVAILABLE: &str = "offline";

pub fn build_payload(cfg: &MonitorConfig, client: &str) -> DiscoveryPayload {
    let backend = cfg.vpn.backend;
    DiscoveryPayload {
        name: format!("VPN client {client}"),
        unique_id: format!("vpn_{}_{}", backend.slug(), client),
        state_topic: cfg.state_topic(client),
        availability_topic: cfg.availability_topic(),
        payload_available: PAYLOAD_AVAILABLE.to_string(),
        payload_not_available: PAYLOAD_NOT_AVAILABLE.to_string(),
        icon: "mdi:vpn".to_string(),
        json_attributes_topic: cfg.attributes_topic(client),
        dev: DeviceInfo {
            identifiers: vec!["tunnelwatch".to_string()],
            manufacturer: backend.manufacturer().to_string(),
            name: "VPN client monitor".to_string(),
            sw_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
    }
}

/// Publie le document retained. Idempotent : réenregistrer un client déjà
/// connu écrase simplement le document précédent.
pub async fn register<C: MessageBus>(bus: &C, cfg: &MonitorConfig, client: &str) -> Result<()> {
    let payload = serde_json::to_vec(&build_payload(cfg, client))?;
    bus.publish(&cfg.discovery_topic(client), QoS::AtLeastOnce, true, payload)
        .await
}

/// Payload vide retained sur le même topic : le hub supprime l'entité.
/// Retirer un client inconnu est sans effet côté broker.
pub async fn retract<C: MessageBus>(bus: &C, cfg: &MonitorConfig, client: &str) -> Result<()> {
    bus.publish(&cfg.discovery_topic(client), QoS::AtLeastOnce, true, Vec::new())
        .await
}

pub async fn publish_availability<C: MessageBus>(bus: &C, cfg: &MonitorConfig) -> Result<()> {
    bus.publish(
        &cfg.availability_topic(),
        QoS::AtLeastOnce,
        true,
        PAYLOAD_AVAILABLE.as_bytes().to_vec(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscoveryPayload;
    use crate::testing::MockBus;

    #[tokio::test]
    async fn register_publishes_the_retained_document() {
        let cfg = MonitorConfig::default();
        let bus = MockBus::new();
        register(&bus, &cfg, "alice").await.unwrap();

        let messages = bus.find_by_topic("homeassistant/sensor/alice/config");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].retain);

        let doc: DiscoveryPayload = serde_json::from_slice(&messages[0].payload).unwrap();
        assert_eq!(doc.name, "VPN client alice");
        assert_eq!(doc.state_topic, "home/nodes/sensor/alice/state");
        assert_eq!(doc.json_attributes_topic, "home/nodes/sensor/alice/attr");
        assert_eq!(doc.availability_topic, "home/nodes/sensor/status");
        assert_eq!(doc.icon, "mdi:vpn");
        assert_eq!(doc.dev.manufacturer, "WireGuard");
    }

    #[tokio::test]
    async fn register_twice_overwrites_with_the_same_document() {
        let cfg = MonitorConfig::default();
        let bus = MockBus::new();
        register(&bus, &cfg, "alice").await.unwrap();
        register(&bus, &cfg, "alice").await.unwrap();

        let messages = bus.find_by_topic("homeassistant/sensor/alice/config");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload, messages[1].payload);
    }

    #[tokio::test]
    async fn retract_clears_the_retained_topic() {
        let cfg = MonitorConfig::default();
        let bus = MockBus::new();
        register(&bus, &cfg, "bob").await.unwrap();
        retract(&bus, &cfg, "bob").await.unwrap();

        let messages = bus.find_by_topic("homeassistant/sensor/bob/config");
        let last = messages.last().unwrap();
        assert!(last.retain);
        assert!(last.payload.is_empty());
    }

    #[tokio::test]
    async fn availability_is_retained_online() {
        let cfg = MonitorConfig::default();
        let bus = MockBus::new();
        publish_availability(&bus, &cfg).await.unwrap();

        let messages = bus.find_by_topic("home/nodes/sensor/status");
        assert_eq!(messages[0].payload, b"online");
        assert!(messages[0].retain);
    }
}
