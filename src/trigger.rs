use std::sync::LazyLock;

use regex::Regex;

use crate::filter::FilterSet;

const SEARCH_VERBS: &[&str] = &[
    "buscar", "procure", "pesquise", "liste", "mostre", "encontre", "ache",
];

const SEARCH_INTENT_PREFIXES: &[&str] = &[
    "me traga",
    "me retorne",
    "quero ver",
    "gostaria de ver",
    "quais carros você tem com",
    "tem algum carro com",
    "procuro por carros com",
];

static SEARCH_OFFER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)posso buscar|devo procurar|gostaria de ver as opções|realizar a busca|vamos ver o que encontro|posso prosseguir com a busca",
    )
    .unwrap()
});

/// What one turn offers to the classifier.
pub struct TurnSignals<'a> {
    utterance: String,
    reply: &'a str,
    filters: &'a FilterSet,
}

impl<'a> TurnSignals<'a> {
    pub fn new(utterance: &str, reply: &'a str, filters: &'a FilterSet) -> Self {
        Self {
            utterance: utterance.trim().to_lowercase(),
            reply,
            filters,
        }
    }
}

/// The rule that decided a search should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user used a search verb.
    SearchVerb,
    /// The user opened with a search-intent phrase.
    IntentPhrase,
    /// The model offered to search and filters are already known.
    ModelOffer,
}

type Rule = (Trigger, fn(&TurnSignals<'_>) -> bool);

/// Evaluated in order; the first rule that holds wins.
const RULES: &[Rule] = &[
    (Trigger::SearchVerb, has_search_verb),
    (Trigger::IntentPhrase, starts_with_intent_phrase),
    (Trigger::ModelOffer, model_offers_search),
];

fn has_search_verb(signals: &TurnSignals<'_>) -> bool {
    SEARCH_VERBS
        .iter()
        .any(|verb| signals.utterance.contains(verb))
}

fn starts_with_intent_phrase(signals: &TurnSignals<'_>) -> bool {
    SEARCH_INTENT_PREFIXES
        .iter()
        .any(|prefix| signals.utterance.starts_with(prefix))
}

fn model_offers_search(signals: &TurnSignals<'_>) -> bool {
    !signals.filters.is_empty() && SEARCH_OFFER_RE.is_match(signals.reply)
}

pub fn classify(signals: &TurnSignals<'_>) -> Option<Trigger> {
    RULES
        .iter()
        .find(|(_, holds)| holds(signals))
        .map(|(trigger, _)| *trigger)
}

/// Whether this turn should run a search now.
pub fn should_search(utterance: &str, reply: &str, filters: &FilterSet) -> bool {
    classify(&TurnSignals::new(utterance, reply, filters)).is_some()
}
