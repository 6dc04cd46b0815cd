use serde::{Deserialize, Serialize};

/// Liste ordonnée des clients connus du backend VPN à l'instant T.
pub type Roster = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnState {
    Connected,
    NotYetConnected,
    Disabled,
    Unknown,
}

/// Faits structurés d'un client pour un cycle. Recalculé à chaque cycle,
/// jamais persisté entre deux cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub client: String,
    pub remote_ip: String,
    pub virtual_ip: String,
    pub received: String,
    pub sent: String,
    pub seen: String,
    pub state: ConnState,
}

impl ClientRecord {
    /// Enregistrement synthétique quand le backend n'a rien retourné
    /// d'exploitable pour ce client (ligne absente, forme inconnue...).
    pub fn placeholder(client: &str, state: ConnState) -> Self {
        Self {
            client: client.to_string(),
            remote_ip: String::new(),
            virtual_ip: String::new(),
            received: String::new(),
            sent: String::new(),
            seen: String::new(),
            state,
        }
    }

    /// Chaîne publiée sur le topic d'état. Un client jamais connecté sans
    /// ligne de détail (course listing/détail) reste "(not yet)" ;
    /// "unknown" est réservé aux lignes de forme inconnue.
    pub fn state_string(&self) -> String {
        if !self.seen.is_empty() && self.state != ConnState::Disabled {
            return self.seen.clone();
        }
        match self.state {
            ConnState::Disabled => "disabled".to_string(),
            ConnState::NotYetConnected => "(not yet)".to_string(),
            _ => "unknown".to_string(),
        }
    }
}

/// Résultat du diff entre deux rosters, consommé immédiatement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl RosterDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Document discovery retained, consommé par le hub domotique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryPayload {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub availability_topic: String,
    pub payload_available: String,
    pub payload_not_available: String,
    pub icon: String,
    pub json_attributes_topic: String,
    pub dev: DeviceInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub manufacturer: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}
