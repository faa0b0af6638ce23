use crate::models::Intent;

// Keyword tables are data, not control flow: new languages or vocabularies
// are added by editing these lists. Matching is substring-based over the
// lowercased utterance, which is deliberately fuzzy.

const GREETINGS: &[&str] = &[
    "oi",
    "olá",
    "ola",
    "oie",
    "hello",
    "hi",
    "hey",
    "eai",
    "e aí",
    "e ai",
    "bom dia",
    "boa tarde",
    "boa noite",
    "tudo bem",
    "tudo bom",
];

const THANKS: &[&str] = &[
    "obrigado",
    "obrigada",
    "brigado",
    "valeu",
    "thanks",
    "thank you",
];

const SHORT_THANKS_LIMIT: usize = 30;

// A topic intent is only assigned when the user signals they want the
// details saved; a topic word alone stays `general`. This keeps the model
// from emitting (and the caller from paying for) a JSON block on every
// casual mention of food or hotels.
const DETAIL_SIGNALS: &[&str] = &[
    "detalhe",
    "detalhes",
    "salvar",
    "salve",
    "adicionar",
    "adicione",
    "incluir",
    "inclua",
    "informações completas",
    "informacoes completas",
    "dados completos",
    "details",
    "save",
    "add",
];

const FIELD_PHRASES: &[&str] = &[
    "nome do",
    "nome da",
    "endereço do",
    "endereço da",
    "endereco do",
    "endereco da",
    "telefone do",
    "telefone da",
    "site do",
    "site da",
    "link do",
    "link da",
    "name of",
    "address of",
    "phone of",
    "website of",
    "link of",
];

// Evaluated in this fixed order; first matching category wins.
const TOPIC_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Accommodation,
        &[
            "hotel",
            "hotéis",
            "hoteis",
            "hospedagem",
            "pousada",
            "hostel",
            "acomodação",
            "acomodacao",
            "resort",
            "airbnb",
            "onde ficar",
            "accommodation",
        ],
    ),
    (
        Intent::Restaurant,
        &[
            "restaurante",
            "comida",
            "comer",
            "jantar",
            "almoço",
            "almoco",
            "almoçar",
            "gastronomia",
            "café",
            "cafe",
            "restaurant",
            "food",
            "dinner",
            "lunch",
        ],
    ),
    (
        Intent::Attraction,
        &[
            "atração",
            "atracao",
            "atrações",
            "atracoes",
            "passeio",
            "museu",
            "ponto turístico",
            "ponto turistico",
            "pontos turísticos",
            "pontos turisticos",
            "atividade",
            "parque",
            "tour",
            "visitar",
            "attraction",
            "museum",
            "activity",
        ],
    ),
];

/// Classify one utterance. Pure function of the text; rules are evaluated
/// in order and the first match wins.
pub fn classify(utterance: &str) -> Intent {
    let text = utterance.trim().to_lowercase();

    if is_greeting(&text) {
        return Intent::Greeting;
    }

    if !wants_details(&text) {
        return Intent::General;
    }

    for (intent, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|k| text.contains(k)) {
            return *intent;
        }
    }

    Intent::General
}

fn is_greeting(text: &str) -> bool {
    let stripped = text
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '…')
        .trim();

    if GREETINGS.iter().any(|g| *g == stripped) {
        return true;
    }

    text.chars().count() < SHORT_THANKS_LIMIT && THANKS.iter().any(|t| text.contains(t))
}

fn wants_details(text: &str) -> bool {
    DETAIL_SIGNALS.iter().any(|s| text.contains(s))
        || FIELD_PHRASES.iter().any(|p| text.contains(p))
}
