/*!
Doubles de test : bus MQTT enregistreur et backend VPN scripté.

Permet d'exercer cycles et publishers sans broker ni binaire pivpn. Les
messages publiés sont capturés pour les assertions ; les handles clonés
partagent le même état, on peut donc faire évoluer le roster scripté au
milieu d'un test pendant que le moniteur possède sa propre copie.
*/
use crate::backend::RosterSource;
use crate::mqtt::MessageBus;
use anyhow::Result;
use parking_lot::Mutex;
use rumqttc::QoS;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Bus factice : enregistre chaque publish dans l'ordre d'émission.
#[derive(Clone, Default)]
pub struct MockBus {
    published: Arc<Mutex<Vec<BusMessage>>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<BusMessage> {
        self.published.lock().clone()
    }

    pub fn find_by_topic(&self, topic: &str) -> Vec<BusMessage> {
        self.published
            .lock()
            .iter()
            .filter(|msg| msg.topic == topic)
            .cloned()
            .collect()
    }

    /// Parse le dernier message d'un topic en JSON.
    pub fn last_json<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match self.find_by_topic(topic).last() {
            Some(msg) => Ok(Some(serde_json::from_slice(&msg.payload)?)),
            None => Ok(None),
        }
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

impl MessageBus for MockBus {
    async fn publish(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.published.lock().push(BusMessage {
            topic: topic.to_string(),
            payload,
            qos,
            retain,
        });
        Ok(())
    }
}

/// Backend scripté : texte de listing et lignes de détail posés par le test.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    list_output: Arc<Mutex<String>>,
    details: Arc<Mutex<HashMap<String, String>>>,
}

impl ScriptedSource {
    pub fn new(list_output: &str) -> Self {
        Self {
            list_output: Arc::new(Mutex::new(list_output.to_string())),
            details: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_detail(self, client: &str, row: &str) -> Self {
        self.details.lock().insert(client.to_string(), row.to_string());
        self
    }

    /// Remplace la sortie de listing (pour simuler un roster qui change
    /// entre deux cycles).
    pub fn set_list(&self, list_output: &str) {
        *self.list_output.lock() = list_output.to_string();
    }

    pub fn set_detail(&self, client: &str, row: &str) {
        self.details.lock().insert(client.to_string(), row.to_string());
    }
}

impl RosterSource for ScriptedSource {
    async fn list_clients(&self) -> String {
        self.list_output.lock().clone()
    }

    async fn client_detail(&self, client: &str) -> String {
        self.details.lock().get(client).cloned().unwrap_or_default()
    }
}
