/**
 * BACKEND - Adaptateur vers l'outil de gestion VPN externe
 *
 * RÔLE : Spawn d'un sous-processus par appel (opération bloquante, point de
 * stall potentiel : le scheduler ne réarme pas tant qu'un cycle est en
 * cours). Aucune validation ici : toute défaillance (binaire absent, code
 * retour non nul, sortie vide) devient un texte vide, loggé, jamais une
 * erreur — un roster vide est un état légitime en aval.
 */
use crate::config::MonitorConfig;
use tokio::process::Command;

#[allow(async_fn_in_trait)]
pub trait RosterSource {
    async fn list_clients(&self) -> String;
    async fn client_detail(&self, client: &str) -> String;
}

/// Source de production : invoque les commandes pivpn configurées.
pub struct PivpnSource {
    list_command: String,
    status_command: String,
}

impl PivpnSource {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            list_command: cfg.vpn.list_command().to_string(),
            status_command: cfg.vpn.status_command().to_string(),
        }
    }
}

async fn run_command(command: &str) -> String {
    let parts = match shell_words::split(command) {
        Ok(parts) if !parts.is_empty() => parts,
        _ => {
            eprintln!("[backend] unusable command: {command}");
            return String::new();
        }
    };
    match Command::new(&parts[0]).args(&parts[1..]).output().await {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
        Ok(out) => {
            eprintln!("[backend] {} exited with {}", parts[0], out.status);
            String::new()
        }
        Err(e) => {
            eprintln!("[backend] failed to run {}: {}", parts[0], e);
            String::new()
        }
    }
}

impl RosterSource for PivpnSource {
    async fn list_clients(&self) -> String {
        run_command(&self.list_command).await
    }

    /// Relance la commande de statut et garde la première ligne où le
    /// client apparaît comme token entier (pas de faux positif par préfixe).
    async fn client_detail(&self, client: &str) -> String {
        let raw = run_command(&self.status_command).await;
        raw.lines()
            .find(|line| line.split_whitespace().any(|token| token == client))
            .unwrap_or("")
            .to_string()
    }
}
