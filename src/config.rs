/**
 * CONFIG - Surface de configuration unique du daemon
 *
 * RÔLE : Un seul fichier YAML (chemin via TUNNELWATCH_CONFIG) chargé au
 * démarrage, jamais relu ensuite. Préfixes de topics, type de backend,
 * identifiants MQTT et cadence de polling sont tous des paramètres : un
 * seul chemin de code pour toutes les variantes de déploiement.
 */
use crate::parser::RosterFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default)]
    pub mqtt: MqttConf,
    #[serde(default)]
    pub vpn: VpnConf,
    #[serde(default)]
    pub topics: TopicsConf,
    /// Cadence de polling, en minutes.
    #[serde(default = "default_update_minutes")]
    pub update_minutes: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct VpnConf {
    #[serde(default)]
    pub backend: VpnBackend,
    /// Commande de listing des clients ; défaut selon le backend.
    #[serde(default)]
    pub list_command: Option<String>,
    /// Commande de détail/statut ; défaut selon le backend.
    #[serde(default)]
    pub status_command: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopicsConf {
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_state_prefix")]
    pub state_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VpnBackend {
    #[default]
    Wireguard,
    Openvpn,
}

impl VpnBackend {
    /// Le backend fixe le format de roster, pas d'auto-détection.
    pub fn roster_format(self) -> RosterFormat {
        match self {
            VpnBackend::Wireguard => RosterFormat::SimpleList,
            VpnBackend::Openvpn => RosterFormat::DetailedTable,
        }
    }

    pub fn manufacturer(self) -> &'static str {
        match self {
            VpnBackend::Wireguard => "WireGuard",
            VpnBackend::Openvpn => "OpenVPN",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            VpnBackend::Wireguard => "wireguard",
            VpnBackend::Openvpn => "openvpn",
        }
    }
}

impl VpnConf {
    pub fn list_command(&self) -> &str {
        match (&self.list_command, self.backend) {
            (Some(cmd), _) => cmd,
            // WireGuard : la liste simple suffit ; OpenVPN : la table
            // détaillée porte aussi les clients désactivés.
            (None, VpnBackend::Wireguard) => "pivpn -l",
            (None, VpnBackend::Openvpn) => "pivpn -c",
        }
    }

    pub fn status_command(&self) -> &str {
        self.status_command.as_deref().unwrap_or("pivpn -c")
    }
}

impl MonitorConfig {
    pub fn discovery_topic(&self, client: &str) -> String {
        format!("{}{}/config", self.topics.discovery_prefix, client)
    }

    pub fn state_topic(&self, client: &str) -> String {
        format!("{}{}/state", self.topics.state_prefix, client)
    }

    pub fn attributes_topic(&self, client: &str) -> String {
        format!("{}{}/attr", self.topics.state_prefix, client)
    }

    /// Topic de disponibilité globale ("online" retained / last-will "offline").
    pub fn availability_topic(&self) -> String {
        format!("{}status", self.topics.state_prefix)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConf::default(),
            vpn: VpnConf::default(),
            topics: TopicsConf::default(),
            update_minutes: default_update_minutes(),
        }
    }
}

impl Default for MqttConf {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            username: None,
            password: None,
            client_id: default_client_id(),
        }
    }
}

impl Default for TopicsConf {
    fn default() -> Self {
        Self {
            discovery_prefix: default_discovery_prefix(),
            state_prefix: default_state_prefix(),
        }
    }
}

fn default_update_minutes() -> u64 {
    1
}
fn default_mqtt_host() -> String {
    "localhost".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "tunnelwatch".to_string()
}
fn default_discovery_prefix() -> String {
    "homeassistant/sensor/".to_string()
}
fn default_state_prefix() -> String {
    "home/nodes/sensor/".to_string()
}

pub fn parse_config(txt: &str) -> Result<MonitorConfig, serde_yaml::Error> {
    serde_yaml::from_str(txt)
}

/// Charge la configuration. Fichier absent ou vide → défauts (loggé) ;
/// fichier illisible ou YAML invalide → fatal, le process doit sortir.
pub async fn load_config() -> Result<MonitorConfig, StartupError> {
    let path = std::env::var("TUNNELWATCH_CONFIG").unwrap_or_else(|_| "tunnelwatch.yaml".into());
    if !Path::new(&path).exists() {
        println!("[config] no {path}, using defaults");
        return Ok(apply_env(MonitorConfig::default()));
    }
    let txt = fs::read_to_string(&path)
        .await
        .map_err(|source| StartupError::ConfigRead {
            path: path.clone(),
            source,
        })?;
    if txt.trim().is_empty() {
        println!("[config] empty {path}, using defaults");
        return Ok(apply_env(MonitorConfig::default()));
    }
    let cfg = parse_config(&txt).map_err(|source| StartupError::ConfigParse { path, source })?;
    Ok(apply_env(cfg))
}

/// Les identifiants MQTT peuvent venir de l'environnement (.env via dotenvy)
/// plutôt que du fichier.
fn apply_env(mut cfg: MonitorConfig) -> MonitorConfig {
    if let Ok(user) = std::env::var("TUNNELWATCH_MQTT_USER") {
        cfg.mqtt.username = Some(user);
    }
    if let Ok(password) = std::env::var("TUNNELWATCH_MQTT_PASSWORD") {
        cfg.mqtt.password = Some(password);
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_broker_and_wireguard() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.mqtt.host, "localhost");
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.update_minutes, 1);
        assert_eq!(cfg.vpn.backend, VpnBackend::Wireguard);
        assert_eq!(cfg.vpn.list_command(), "pivpn -l");
        assert_eq!(cfg.vpn.status_command(), "pivpn -c");
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let cfg = parse_config(
            "mqtt:\n  host: 192.168.10.84\n  username: homeassistant\nvpn:\n  backend: openvpn\n",
        )
        .unwrap();
        assert_eq!(cfg.mqtt.host, "192.168.10.84");
        assert_eq!(cfg.mqtt.port, 1883);
        assert_eq!(cfg.vpn.backend, VpnBackend::Openvpn);
        assert_eq!(cfg.vpn.list_command(), "pivpn -c");
        assert_eq!(cfg.topics.discovery_prefix, "homeassistant/sensor/");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(parse_config("mqtt: [not a map").is_err());
    }

    #[test]
    fn topics_derive_from_prefixes() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.discovery_topic("alice"), "homeassistant/sensor/alice/config");
        assert_eq!(cfg.state_topic("alice"), "home/nodes/sensor/alice/state");
        assert_eq!(cfg.attributes_topic("alice"), "home/nodes/sensor/alice/attr");
        assert_eq!(cfg.availability_topic(), "home/nodes/sensor/status");
    }

    #[test]
    fn backend_selects_the_roster_format() {
        use crate::parser::RosterFormat;
        assert_eq!(VpnBackend::Wireguard.roster_format(), RosterFormat::SimpleList);
        assert_eq!(VpnBackend::Openvpn.roster_format(), RosterFormat::DetailedTable);
    }
}
