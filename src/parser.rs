/**
 * PARSER - Découpage du texte tabulaire produit par l'outil de gestion VPN
 *
 * RÔLE : Fonctions pures (texte entrant, structures sortantes), aucune I/O.
 * Le parsing par offsets/strides de tokens est fragile par construction : il
 * dépend du nombre de colonnes émis par l'outil amont. Tout est donc isolé
 * ici pour qu'un changement de format ne touche ni le scheduler ni les
 * publishers.
 */
use crate::models::{ClientRecord, ConnState, Roster};

/// Format de roster, sélectionné par la configuration (jamais auto-détecté).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    /// Format A : table à largeur fixe, en-tête de 9 tokens puis un nom
    /// tous les 7 tokens (sortie type `pivpn -l`).
    SimpleList,
    /// Format B : table détaillée à largeur variable, séparateurs `:::`,
    /// marqueur `[disabled]` (sortie type `pivpn -c`).
    DetailedTable,
}

// Format A
const SIMPLE_LIST_HEADER: usize = 9;
const SIMPLE_LIST_STRIDE: usize = 7;

// Format B
const SEPARATOR_TOKEN: &str = ":::";
const SEPARATOR_WIDTH: usize = 4;
const DISABLED_MARKER: &str = "[disabled]";

// Classification d'un enregistrement, indépendante du format une fois
// tokenisé : le token à l'offset 5 vaut "(not" pour un client jamais
// connecté (ligne courte), sinon la ligne porte un horodatage multi-tokens.
const SEEN_OFFSET: usize = 5;
const NOT_SEEN_SENTINEL: &str = "(not";
const SHORT_ROW: usize = 7;
const LONG_ROW: usize = 10;

/// Extrait la séquence ordonnée des identifiants clients du texte brut.
/// Un texte vide ou inattendu donne un roster vide, jamais une erreur.
pub fn parse_roster(raw: &str, format: RosterFormat) -> Roster {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match format {
        RosterFormat::SimpleList => parse_simple_list(&tokens),
        RosterFormat::DetailedTable => parse_detailed_table(&tokens),
    }
}

fn parse_simple_list(tokens: &[&str]) -> Roster {
    if tokens.len() <= SIMPLE_LIST_HEADER {
        return Vec::new();
    }
    let count = (tokens.len() - SIMPLE_LIST_HEADER) / SIMPLE_LIST_STRIDE;
    (0..count)
        .map(|row| tokens[SIMPLE_LIST_HEADER + row * SIMPLE_LIST_STRIDE].to_string())
        .collect()
}

fn parse_detailed_table(tokens: &[&str]) -> Roster {
    let mut roster = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == SEPARATOR_TOKEN {
            i += SEPARATOR_WIDTH;
            continue;
        }
        if tokens[i] == DISABLED_MARKER {
            if let Some(name) = tokens.get(i + 1) {
                roster.push(name.to_string());
            }
            i += 2;
            continue;
        }
        roster.push(tokens[i].to_string());
        let width = if tokens.get(i + SEEN_OFFSET) == Some(&NOT_SEEN_SENTINEL) {
            SHORT_ROW
        } else {
            LONG_ROW
        };
        i += width;
    }
    roster
}

/// Construit le ClientRecord d'un client à partir de sa ligne de détail.
/// Ne panique jamais : ligne absente ou forme inconnue → enregistrement
/// synthétique best-effort.
pub fn parse_record(raw: &str, client: &str) -> ClientRecord {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.is_empty() {
        // course possible : client retiré entre le listing et le détail
        return ClientRecord::placeholder(client, ConnState::NotYetConnected);
    }
    if tokens[0] == DISABLED_MARKER {
        return ClientRecord::placeholder(client, ConnState::Disabled);
    }
    if tokens.len() < SHORT_ROW {
        return ClientRecord::placeholder(client, ConnState::Unknown);
    }

    let (state, seen_end) = if tokens[SEEN_OFFSET] == NOT_SEEN_SENTINEL {
        (ConnState::NotYetConnected, SHORT_ROW)
    } else {
        (ConnState::Connected, LONG_ROW.min(tokens.len()))
    };

    ClientRecord {
        client: tokens[0].to_string(),
        remote_ip: tokens[1].to_string(),
        virtual_ip: tokens[2].to_string(),
        received: tokens[3].to_string(),
        sent: tokens[4].to_string(),
        seen: tokens[SEEN_OFFSET..seen_end].join(" "),
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sorties figées au format pivpn, utilisées comme vecteurs de test.
    const SIMPLE_LIST: &str = "\
::: Clients Summary :::
Client Public Key Creation Date
alice hXgbnKq83k+dfmPYEC2Jzo0= 5A2xWJq1M9u7PmCgQbd44eo= 30th Apr 2026, 17:02
bob Y7j0aDpnnVcxPhMiuKzoQ1A= pR8eLdt6T0jvBqW2sHy55cU= 2nd May 2026, 09:41
carol mm1VdQ9rr2ChwXGeNTz3o8I= kWq64bYxPzS0vLtJeuA11gM= 14th Jun 2026, 22:10
";

    const DETAILED_TABLE: &str = "\
::: Connected Clients :::
alice 192.168.1.50:51820 10.6.0.2 1.2MiB 3.4MiB Aug 29 2026 - 10:02:11
bob (none) 10.6.0.3 0B 0B (not yet)
[disabled] carol
::: Disabled Clients :::
";

    #[test]
    fn simple_list_walks_the_stride() {
        let roster = parse_roster(SIMPLE_LIST, RosterFormat::SimpleList);
        assert_eq!(roster, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn simple_list_count_matches_token_arithmetic() {
        let tokens: Vec<&str> = SIMPLE_LIST.split_whitespace().collect();
        let expected = (tokens.len() - SIMPLE_LIST_HEADER) / SIMPLE_LIST_STRIDE;
        let roster = parse_roster(SIMPLE_LIST, RosterFormat::SimpleList);
        assert_eq!(roster.len(), expected);
        for (row, name) in roster.iter().enumerate() {
            assert_eq!(name, tokens[SIMPLE_LIST_HEADER + row * SIMPLE_LIST_STRIDE]);
        }
    }

    #[test]
    fn simple_list_header_only_is_empty() {
        let roster = parse_roster("::: Clients Summary ::: Client Public Key Creation Date", RosterFormat::SimpleList);
        assert!(roster.is_empty());
    }

    #[test]
    fn detailed_table_mixes_row_shapes() {
        let roster = parse_roster(DETAILED_TABLE, RosterFormat::DetailedTable);
        assert_eq!(roster, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn disabled_marker_never_classifies_as_connected() {
        let record = parse_record("[disabled] carol trailing junk here", "carol");
        assert_eq!(record.state, ConnState::Disabled);
        assert_eq!(record.client, "carol");
        assert_eq!(record.state_string(), "disabled");
    }

    #[test]
    fn empty_text_gives_empty_roster() {
        assert!(parse_roster("", RosterFormat::SimpleList).is_empty());
        assert!(parse_roster("", RosterFormat::DetailedTable).is_empty());
    }

    #[test]
    fn short_record_joins_two_seen_tokens() {
        let record = parse_record("bob (none) 10.6.0.3 0B 0B (not yet)", "bob");
        assert_eq!(record.state, ConnState::NotYetConnected);
        assert_eq!(record.seen, "(not yet)");
        assert_eq!(record.state_string(), "(not yet)");
        assert_eq!(record.remote_ip, "(none)");
    }

    #[test]
    fn long_record_reassembles_the_timestamp() {
        let record = parse_record(
            "alice 192.168.1.50:51820 10.6.0.2 1.2MiB 3.4MiB Aug 29 2026 - 10:02:11",
            "alice",
        );
        assert_eq!(record.state, ConnState::Connected);
        assert_eq!(record.seen, "Aug 29 2026 - 10:02:11");
        assert_eq!(record.virtual_ip, "10.6.0.2");
        assert_eq!(record.received, "1.2MiB");
        assert_eq!(record.sent, "3.4MiB");
    }

    #[test]
    fn missing_detail_row_yields_placeholder() {
        let record = parse_record("", "ghost");
        assert_eq!(record.client, "ghost");
        assert_eq!(record.state, ConnState::NotYetConnected);
        assert!(record.remote_ip.is_empty());
        assert!(record.seen.is_empty());
        // distinct d'une ligne inexploitable, qui donne "unknown"
        assert_eq!(record.state_string(), "(not yet)");
    }

    #[test]
    fn unrecognized_shape_yields_unknown_placeholder() {
        let record = parse_record("alice 10.6.0.2 1.2MiB", "alice");
        assert_eq!(record.state, ConnState::Unknown);
        assert_eq!(record.state_string(), "unknown");
    }
}
