//! Business vocabulary synonyms (Dutch/English with German, Spanish and
//! French variants).

use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::normalize::normalize_name;

/// Canonical term followed by its equivalents.
const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
    // Common business terms
    ("klant", &["customer", "client", "kunde"]),
    ("naam", &["name", "naam", "bezeichnung"]),
    ("adres", &["address", "adresse"]),
    ("land", &["country", "land", "pais"]),
    ("bedrag", &["amount", "betrag", "montant"]),
    ("datum", &["date", "datum", "fecha"]),
    ("nummer", &["number", "nummer", "numero"]),
    ("code", &["code", "kode"]),
    ("beschrijving", &["description", "beschreibung", "descripcion"]),
    ("status", &["status", "staat"]),
    ("actief", &["active", "aktiv"]),
    ("blokkeren", &["block", "blockieren"]),
    ("vlag", &["flag", "flagge"]),
    ("controle", &["control", "kontrolle"]),
    ("indicatie", &["indicator", "indikator"]),
    // Banking
    ("bank", &["bank", "banco"]),
    ("rekening", &["account", "konto", "cuenta"]),
    ("saldo", &["balance", "saldo"]),
    ("transactie", &["transaction", "transaktion"]),
    ("betaling", &["payment", "zahlung", "pago"]),
    ("overboekingen", &["transfer", "uberweisung"]),
    // Technical
    ("sleutel", &["key", "schlussel", "clave"]),
    ("waarde", &["value", "wert", "valor"]),
    ("type", &["type", "typ", "tipo"]),
    ("referentie", &["reference", "referenz", "referencia"]),
    ("versie", &["version", "version"]),
    ("configuratie", &["configuration", "konfiguration"]),
];

static BUILTIN: LazyLock<SynonymTable> = LazyLock::new(|| {
    SynonymTable::new(
        BUILTIN_SYNONYMS
            .iter()
            .map(|(key, values)| (*key, values.iter().copied())),
    )
});

#[derive(Debug, Clone)]
struct SynonymEntry {
    key: String,
    values: Vec<String>,
}

/// Immutable canonical-term → equivalents table, stored normalized.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Builds a table; keys and values are normalized with
    /// [`normalize_name`], entry order is kept.
    pub fn new<K, V, I>(entries: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = V>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, values)| SynonymEntry {
                key: normalize_name(key.as_ref()),
                values: values
                    .into_iter()
                    .map(|value| normalize_name(value.as_ref()))
                    .collect(),
            })
            .collect();
        Self { entries }
    }

    /// Process-wide built-in vocabulary.
    pub fn builtin() -> &'static SynonymTable {
        &BUILTIN
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized synonyms of `term`.
    ///
    /// A key hit returns that key's values and stops scanning. A value hit
    /// contributes the key plus the sibling values, and scanning continues
    /// with the next entry.
    pub fn find_synonyms(&self, term: &str) -> BTreeSet<String> {
        self.find_normalized(&normalize_name(term))
    }

    fn find_normalized(&self, term: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for entry in &self.entries {
            if entry.key == term {
                found.extend(entry.values.iter().cloned());
                break;
            }
            if entry.values.iter().any(|value| value == term) {
                found.insert(entry.key.clone());
                found.extend(entry.values.iter().filter(|v| *v != term).cloned());
            }
        }
        found
    }

    /// True when both terms normalize equal or either lists the other as a
    /// synonym.
    pub fn is_synonym_match(&self, a: &str, b: &str) -> bool {
        let a = normalize_name(a);
        let b = normalize_name(b);
        if a == b {
            return true;
        }
        self.find_normalized(&a).contains(&b) || self.find_normalized(&b).contains(&a)
    }
}
