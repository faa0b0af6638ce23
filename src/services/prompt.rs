use crate::models::{ChatStyle, Intent};

const DEFAULT_PERSONA: &str = "Você é um concierge de viagens atencioso que ajuda o usuário a planejar o roteiro, sugerindo restaurantes, hospedagens e atrações.";

const GUARDRAILS: &str = "Responda sempre dentro do contexto da viagem atual do usuário (destino e datas informados). Só inclua um bloco JSON quando o usuário pedir explicitamente para salvar ou detalhar uma sugestão.";

const RESTAURANT_TASK: &str = r#"Quando o usuário pedir para salvar ou detalhar um restaurante, termine a resposta com um único bloco de código JSON exatamente neste formato:

```json
{
  "restaurant": {
    "name": "Nome do restaurante",
    "cuisine": "Tipo de cozinha",
    "description": "Breve descrição",
    "address": "Endereço completo",
    "price_range": "Faixa de preço, ex: €€",
    "website": "https://exemplo.com",
    "map_url": "https://www.google.com/maps/search/?api=1&query=Nome+Endereço"
  }
}
```

Use URLs completas. Monte o map_url no formato https://www.google.com/maps/search/?api=1&query=<nome>+<endereço>. Não escreva nada depois do bloco JSON."#;

const ITINERARY_TASK: &str = r#"Quando o usuário pedir para salvar ou detalhar uma atração ou atividade, termine a resposta com um único bloco de código JSON exatamente neste formato:

```json
{
  "itinerary_item": {
    "title": "Nome da atração ou atividade",
    "description": "Breve descrição",
    "address": "Endereço completo",
    "estimated_cost": "Custo estimado, ex: € 18",
    "website": "https://exemplo.com",
    "map_url": "https://www.google.com/maps/search/?api=1&query=Nome+Endereço"
  }
}
```

Use URLs completas. Monte o map_url no formato https://www.google.com/maps/search/?api=1&query=<nome>+<endereço>. Não escreva nada depois do bloco JSON."#;

const ACCOMMODATION_TASK: &str = r#"Quando o usuário pedir para salvar ou detalhar uma hospedagem, termine a resposta com um único bloco de código JSON exatamente neste formato:

```json
{
  "accommodation": {
    "name": "Nome da hospedagem",
    "type": "hotel, pousada, hostel ou apartamento",
    "description": "Breve descrição",
    "address": "Endereço completo",
    "price_per_night": "Preço por noite, ex: R$ 600",
    "check_in": "2025-03-10",
    "check_out": "2025-03-15",
    "website": "https://exemplo.com",
    "map_url": "https://www.google.com/maps/search/?api=1&query=Nome+Endereço"
  }
}
```

Use URLs completas. Monte o map_url no formato https://www.google.com/maps/search/?api=1&query=<nome>+<endereço>. Não escreva nada depois do bloco JSON."#;

const GENERAL_TASK: &str = "Não inclua blocos JSON nem blocos de código na resposta. Se o usuário demonstrar interesse em guardar alguma sugestão, explique que basta pedir \"detalhes de X\" ou \"salvar X\".";

/// Compose the system instructions: persona, guardrails, style directives
/// and the per-intent task section, always in this order.
pub fn build_system_prompt(intent: Intent, custom_instructions: &str, style: &ChatStyle) -> String {
    let persona = if custom_instructions.trim().is_empty() {
        DEFAULT_PERSONA
    } else {
        custom_instructions.trim()
    };

    let task = match intent {
        Intent::Restaurant => RESTAURANT_TASK,
        Intent::Attraction => ITINERARY_TASK,
        Intent::Accommodation => ACCOMMODATION_TASK,
        // Greetings are answered locally and never reach this builder; if
        // one slips through it gets the general treatment.
        Intent::Greeting | Intent::General => GENERAL_TASK,
    };

    format!(
        "{persona}\n\n{GUARDRAILS}\n\n{}\n\n{task}",
        style_directives(style)
    )
}

fn style_directives(style: &ChatStyle) -> String {
    let tone = match style.tone.as_str() {
        "formal" => "Use um tom formal e cortês.",
        "neutro" => "Use um tom neutro e objetivo.",
        _ => "Use um tom casual e acolhedor.",
    };

    let emojis = if style.emojis {
        "Use emojis com moderação e apenas quando fizerem sentido no contexto."
    } else {
        "Não use emojis."
    };

    format!("{tone} {emojis} Mantenha o texto curto. Termine com uma pergunta empática de acompanhamento.")
}

/// Canned reply for greetings; no provider round-trip is made for these.
pub fn greeting_reply(destination: Option<&str>, style: &ChatStyle) -> String {
    let mut reply = match destination {
        Some(dest) if !dest.trim().is_empty() => format!(
            "Oi! Que bom te ver por aqui. Como posso ajudar no planejamento da sua viagem para {dest}?"
        ),
        _ => "Oi! Que bom te ver por aqui. Como posso ajudar no planejamento da sua viagem?"
            .to_string(),
    };

    if style.emojis {
        reply.push_str(" 😊");
    }

    reply
}

/// Last-resort reply when the providers produced nothing usable.
pub fn fallback_reply(destination: Option<&str>) -> String {
    let place = destination
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!(" em {d}"))
        .unwrap_or_default();

    format!(
        "Não consegui gerar uma resposta completa agora. Quer explorar comida, atrações, museus ou compras{place}? Para guardar uma sugestão, é só pedir \"detalhes de X\" ou \"salvar X\"."
    )
}
