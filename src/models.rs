/// Catalog entry for a selectable upstream model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub is_default: bool,
}

pub const DEFAULT_MODEL_ID: &str = "gpt-4o";

const CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: "gpt-4o",
        name: "GPT-4o",
        description: "Great for most tasks",
        is_default: true,
    },
    ModelInfo {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        description: "Uses advanced reasoning",
        is_default: false,
    },
    ModelInfo {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        description: "Fastest at advanced reasoning",
        is_default: false,
    },
    ModelInfo {
        id: "gpt-4-vision-preview",
        name: "GPT-4 Vision",
        description: "Great at coding and visual reasoning",
        is_default: false,
    },
];

/// Read-only model catalog exposed to the UI.
pub fn catalog() -> &'static [ModelInfo] {
    CATALOG
}

pub fn default_model() -> &'static ModelInfo {
    CATALOG
        .iter()
        .find(|model| model.is_default)
        .unwrap_or(&CATALOG[0])
}

pub fn find(id: &str) -> Option<&'static ModelInfo> {
    CATALOG.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_default_entry() {
        assert_eq!(CATALOG.iter().filter(|model| model.is_default).count(), 1);
        assert_eq!(default_model().id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn find_resolves_known_ids_only() {
        assert_eq!(find("gpt-4o-mini").map(|m| m.name), Some("GPT-4o Mini"));
        assert!(find("gpt-99").is_none());
    }
}
