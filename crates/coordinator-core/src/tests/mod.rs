mod params;
mod state;

use crate::TemplateAliases;

/// Redirect table resembling the live wiki's: one canonical title plus a handful of redirects.
pub(crate) fn sample_aliases() -> TemplateAliases {
    TemplateAliases::new()
        .with(
            "Template:Coord",
            vec![
                "Template:Coordinates".to_string(),
                "Template:Coor dms".to_string(),
                "Template:COORD".to_string(),
            ],
        )
        .with(
            "Template:Coord missing",
            vec![
                "Template:Coordinates missing".to_string(),
                "Template:Missing coordinates".to_string(),
            ],
        )
}

/// Wraps section content in a minimal Parsoid page.
pub(crate) fn page(sections: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"/><title>Statue</title></head><body>{sections}</body></html>"
    )
}
