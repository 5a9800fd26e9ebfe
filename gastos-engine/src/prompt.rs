//! Prompt construction for one chunk of descriptions.
//!
//! The prompt carries the taxonomy as an allow-list, a fixed set of
//! disambiguation hints, an optional income/expense hint derived from the
//! amount column, and the chunk as a 1-based numbered list.

use gastos_core::{AmountKind, Taxonomy};

pub const SYSTEM_PROMPT: &str = "Eres un asistente que clasifica movimientos bancarios en \
categorías de finanzas personales. Respondes únicamente con la lista solicitada, \
una línea por movimiento, sin comentarios adicionales.";

/// A merchant/service hint, only emitted when its category is in the taxonomy.
struct Hint {
    category: &'static str,
    text: &'static str,
}

const HINTS: &[Hint] = &[
    Hint {
        category: "Comida",
        text: "Supermercados, restaurantes, cafeterías y delivery de comida (Uber Eats, Rappi, PedidosYa) son Comida.",
    },
    Hint {
        category: "Transporte",
        text: "Uber, Cabify y DiDi (viajes), taxis, metro, peajes, estacionamientos y combustible son Transporte.",
    },
    Hint {
        category: "Salud",
        text: "Farmacias, clínicas, laboratorios, isapres y consultas médicas o dentales son Salud.",
    },
    Hint {
        category: "Vivienda",
        text: "Arriendo, dividendo o hipoteca y gastos comunes son Vivienda.",
    },
    Hint {
        category: "Entretenimiento",
        text: "Netflix, Spotify, Disney+, HBO, cines, conciertos y videojuegos son Entretenimiento.",
    },
    Hint {
        category: "Servicios",
        text: "Luz, agua, gas, internet, telefonía y TV cable son Servicios.",
    },
    Hint {
        category: "Transferencias",
        text: "Transferencias entre personas o entre cuentas propias son Transferencias, salvo que sean sueldo u honorarios.",
    },
    Hint {
        category: "Ingresos",
        text: "Sueldos, honorarios, devoluciones y abonos de remuneraciones son Ingresos.",
    },
    Hint {
        category: "Deuda",
        text: "Cuotas de créditos, pagos de tarjeta, intereses, comisiones bancarias y avances son Deuda.",
    },
    Hint {
        category: "Compras",
        text: "Tiendas, retail y marketplaces (Amazon, Mercado Libre, Falabella, AliExpress) son Compras.",
    },
];

fn amount_hint(kind: AmountKind) -> &'static str {
    match kind {
        AmountKind::Signed => {
            "Los montos no se muestran: usa Ingresos solo cuando la descripción indique claramente dinero recibido (sueldo, abono, devolución)."
        }
        AmountKind::Credit => {
            "Todos estos movimientos provienen de una columna de abonos: son dinero recibido, así que prefiere Ingresos o Transferencias."
        }
        AmountKind::Debit => {
            "Todos estos movimientos provienen de una columna de cargos: son gastos, así que no uses Ingresos salvo devoluciones explícitas."
        }
    }
}

/// Build the user prompt for one chunk.
pub fn build_prompt<S: AsRef<str>>(
    taxonomy: &Taxonomy,
    descriptions: &[S],
    amount_kind: Option<AmountKind>,
    explain: bool,
) -> String {
    let mut p = String::new();
    p.push_str("Clasifica cada movimiento bancario en exactamente una de estas categorías:\n");
    for (i, label) in taxonomy.labels().iter().enumerate() {
        p.push_str(&format!("{}. {}\n", i + 1, label));
    }

    p.push_str("\nReglas:\n");
    for hint in HINTS.iter().filter(|h| taxonomy.contains(h.category)) {
        p.push_str(&format!("- {}\n", hint.text));
    }
    if let Some(kind) = amount_kind {
        p.push_str(&format!("- {}\n", amount_hint(kind)));
    }
    p.push_str("- Usa solo categorías de la lista, escritas tal cual; nunca inventes categorías nuevas.\n");

    p.push_str(&format!(
        "\nResponde con exactamente {} líneas, una por movimiento y en el mismo orden, ",
        descriptions.len()
    ));
    if explain {
        p.push_str("con el formato \"N. Categoría | explicación breve (máximo 12 palabras)\".\n");
    } else {
        p.push_str("con el formato \"N. Categoría\".\n");
    }

    p.push_str("\nMovimientos:\n");
    for (i, d) in descriptions.iter().enumerate() {
        // one item per line: embedded newlines would shift the numbering
        let one_line = d.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        p.push_str(&format!("{}. {}\n", i + 1, one_line));
    }
    p
}
