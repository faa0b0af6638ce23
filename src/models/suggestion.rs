use serde::{Deserialize, Serialize};

/// A machine-parseable suggestion embedded in a model reply. The wire shape
/// is externally tagged, i.e. `{"restaurant": {...}}`, which is exactly how
/// the model is instructed to emit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuredSuggestion {
    Restaurant(RestaurantSuggestion),
    ItineraryItem(ItineraryItemSuggestion),
    Accommodation(AccommodationSuggestion),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestaurantSuggestion {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub price_range: Option<String>,
    pub website: Option<String>,
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryItemSuggestion {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub estimated_cost: Option<String>,
    pub website: Option<String>,
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccommodationSuggestion {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub price_per_night: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub website: Option<String>,
    pub map_url: Option<String>,
}

impl StructuredSuggestion {
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Short display sentence used when the model emitted a JSON block and
    /// nothing else.
    pub fn summary(&self) -> String {
        match self {
            StructuredSuggestion::Restaurant(r) => {
                let mut s = format!(
                    "Encontrei um restaurante para você: {}.",
                    r.name.as_deref().unwrap_or("uma boa opção")
                );
                if let Some(cuisine) = r.cuisine.as_deref() {
                    s.push_str(&format!(" Cozinha: {cuisine}."));
                }
                if let Some(address) = r.address.as_deref() {
                    s.push_str(&format!(" Fica em {address}."));
                }
                s
            }
            StructuredSuggestion::ItineraryItem(i) => {
                let mut s = format!(
                    "Encontrei uma atividade para o seu roteiro: {}.",
                    i.title.as_deref().unwrap_or("uma boa opção")
                );
                if let Some(description) = i.description.as_deref() {
                    s.push_str(&format!(" {description}"));
                }
                if let Some(address) = i.address.as_deref() {
                    s.push_str(&format!(" Fica em {address}."));
                }
                s
            }
            StructuredSuggestion::Accommodation(a) => {
                let mut s = format!(
                    "Encontrei uma hospedagem para você: {}.",
                    a.name.as_deref().unwrap_or("uma boa opção")
                );
                if let Some(description) = a.description.as_deref() {
                    s.push_str(&format!(" {description}"));
                }
                if let Some(address) = a.address.as_deref() {
                    s.push_str(&format!(" Fica em {address}."));
                }
                s
            }
        }
    }
}
