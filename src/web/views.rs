//! HTML rendering for the three-tab UI.
//!
//! Pure string building: every function takes data and returns markup,
//! so the card renderer and the placeholder fallback are testable without
//! a running server. All interpolated data is escaped here and nowhere else.

use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::i18n::{tr, tr_title};
use crate::model::Recipe;
use crate::session::{Flash, FlashKind};
use crate::store::SortOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Add,
    Browse,
    Search,
}

/// How a card should be decorated.
pub(crate) struct CardOptions<'a> {
    pub show_delete: bool,
    /// Delete pressed once; render the confirm/cancel pair.
    pub armed: bool,
    /// Path the delete forms return to.
    pub from: &'a str,
}

impl Default for CardOptions<'_> {
    fn default() -> Self {
        Self {
            show_delete: false,
            armed: false,
            from: "/",
        }
    }
}

/// Full page shell: RTL, Hebrew, tab navigation.
pub(crate) fn page(active: Tab, content: &str) -> String {
    let tab = |target: Tab, href: &str, icon: &str, label: &str| {
        let class = if target == active { "tab active" } else { "tab" };
        format!("<a class=\"{class}\" href=\"{href}\">{icon} {}</a>", encode_text(label))
    };

    format!(
        "<!DOCTYPE html>\n\
         <html dir=\"rtl\" lang=\"he\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <link rel=\"stylesheet\" href=\"/style.css\">\n\
         </head>\n\
         <body>\n\
         <h1>🍲 {title}</h1>\n\
         <nav class=\"tabs\">{add}{browse}{search}</nav>\n\
         <main>\n{content}\n</main>\n\
         </body>\n\
         </html>\n",
        title = encode_text(tr("app_title")),
        add = tab(Tab::Add, "/", "📝", tr("add_recipe")),
        browse = tab(Tab::Browse, "/recipes", "📚", tr("my_recipes")),
        search = tab(Tab::Search, "/search", "🔍", tr("search_recipes")),
    )
}

pub(crate) fn flash_html(flash: &Flash) -> String {
    let class = match flash.kind {
        FlashKind::Success => "flash flash-success",
        FlashKind::Error => "flash flash-error",
        FlashKind::Warning => "flash flash-warning",
        FlashKind::Info => "flash flash-info",
    };
    format!("<div class=\"{class}\">{}</div>", encode_text(&flash.text))
}

/// The add tab: source forms, optional preview card, save controls.
pub(crate) fn add_page(
    preview: Option<&Recipe>,
    just_saved: bool,
    flashes: &[Flash],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("<h2>{}</h2>", encode_text(tr("add_recipe"))));

    for flash in flashes {
        out.push_str(&flash_html(flash));
    }

    // URL form
    out.push_str(&format!(
        "<section class=\"add-form\">\n\
         <h3>{from_url}</h3>\n\
         <form method=\"post\" action=\"/extract\">\n\
         <label for=\"url\">{label}</label>\n\
         <input type=\"text\" id=\"url\" name=\"url\" dir=\"ltr\" \
          placeholder=\"https://www.example-recipe.com/...\">\n\
         <button type=\"submit\">{button}</button>\n\
         </form>\n\
         </section>\n",
        from_url = encode_text(tr("add_from_url")),
        label = encode_text(tr("enter_url")),
        button = encode_text(tr("extract_recipe")),
    ));

    // Image form
    out.push_str(&format!(
        "<section class=\"add-form\">\n\
         <h3>{from_image}</h3>\n\
         <form method=\"post\" action=\"/extract-image\" enctype=\"multipart/form-data\">\n\
         <label for=\"image\">{label}</label>\n\
         <input type=\"file\" id=\"image\" name=\"image\" accept=\"image/*\">\n\
         <button type=\"submit\">{button}</button>\n\
         </form>\n\
         </section>\n",
        from_image = encode_text(tr("add_from_image")),
        label = encode_text(tr("upload_image")),
        button = encode_text(tr("extract_from_image")),
    ));

    if just_saved {
        out.push_str(&flash_html(&Flash {
            kind: FlashKind::Success,
            text: tr("recipe_saved").to_string(),
        }));
    }

    if let Some(recipe) = preview {
        out.push_str("<hr>");
        out.push_str(&format!("<h2>{}</h2>", encode_text(tr("recipe_preview"))));
        out.push_str(&recipe_card(recipe, &CardOptions::default()));

        if recipe.image_url.is_none() && recipe.image_data_b64.is_none() {
            out.push_str(&format!(
                "<div class=\"flash flash-info\">{hint}</div>\n\
                 <form method=\"post\" action=\"/preview/image\" \
                  enctype=\"multipart/form-data\" class=\"manual-upload\">\n\
                 <label for=\"manual-image\">{label}</label>\n\
                 <input type=\"file\" id=\"manual-image\" name=\"image\" accept=\"image/*\">\n\
                 <button type=\"submit\">{button}</button>\n\
                 </form>\n",
                hint = encode_text(tr("manual_img_upload")),
                label = encode_text(tr("upload_img_recipe")),
                button = encode_text(tr("upload_img_recipe")),
            ));
        }

        out.push_str(&format!(
            "<form method=\"post\" action=\"/save\">\
             <button type=\"submit\" class=\"primary\">{}</button>\
             </form>\n",
            encode_text(tr("save_recipe"))
        ));
    }

    page(Tab::Add, &out)
}

/// Everything the browse tab needs to render.
pub(crate) struct BrowseContext<'a> {
    /// Filtered records in display order.
    pub recipes: Vec<&'a Recipe>,
    /// Count before filtering.
    pub total: usize,
    pub sort: SortOrder,
    pub cuisines: Vec<String>,
    pub meal_types: Vec<String>,
    pub selected_cuisine: Option<&'a str>,
    pub selected_meal: Option<&'a str>,
    pub pending_delete: &'a HashSet<String>,
    pub flash: Option<Flash>,
    /// Path (with query) the delete forms return to.
    pub from: String,
}

pub(crate) fn browse_page(ctx: &BrowseContext<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<h2>{}</h2>",
        encode_text(tr("recipe_collection"))
    ));

    if let Some(flash) = &ctx.flash {
        out.push_str(&flash_html(flash));
    }

    // Refresh + sort controls
    out.push_str(&format!(
        "<div class=\"list-controls\">\n\
         <form method=\"post\" action=\"/recipes/refresh\">\
         <button type=\"submit\">{refresh}</button></form>\n\
         <form method=\"get\" action=\"/recipes\" class=\"sort-form\">\n\
         <label for=\"sort\">{sort_by}</label>\n\
         <select id=\"sort\" name=\"sort\">{options}</select>\n\
         {filters_hidden}\
         <button type=\"submit\">{sort_by}</button>\n\
         </form>\n\
         </div>\n",
        refresh = encode_text(tr("refresh_recipes")),
        sort_by = encode_text(tr("sort_by")),
        options = sort_options(ctx.sort),
        filters_hidden = hidden_inputs(&[
            ("cuisine", ctx.selected_cuisine),
            ("meal", ctx.selected_meal)
        ]),
    ));

    if ctx.total == 0 {
        out.push_str(&format!(
            "<div class=\"flash flash-info\">{}</div>",
            encode_text(tr("no_recipes"))
        ));
        return page(Tab::Browse, &out);
    }

    out.push_str(&format!(
        "<p class=\"count-line\">{} <strong>{}</strong> {}</p>",
        encode_text(tr("you_have")),
        ctx.total,
        encode_text(tr("saved_recipes")),
    ));

    // Cuisine / meal-type filters
    out.push_str(&format!(
        "<details class=\"filters\"><summary>{title}</summary>\n\
         <form method=\"get\" action=\"/recipes\">\n\
         <label for=\"cuisine\">{cuisine}</label>\n\
         <select id=\"cuisine\" name=\"cuisine\">{cuisine_options}</select>\n\
         <label for=\"meal\">{meal}</label>\n\
         <select id=\"meal\" name=\"meal\">{meal_options}</select>\n\
         <input type=\"hidden\" name=\"sort\" value=\"{sort}\">\n\
         <button type=\"submit\">{title}</button>\n\
         </form></details>\n",
        title = encode_text(tr("filter_recipes")),
        cuisine = encode_text(tr("cuisine")),
        cuisine_options = filter_options(&ctx.cuisines, ctx.selected_cuisine),
        meal = encode_text(tr("meal_type")),
        meal_options = filter_options(&ctx.meal_types, ctx.selected_meal),
        sort = ctx.sort.as_str(),
    ));

    if ctx.recipes.is_empty() {
        out.push_str(&format!(
            "<div class=\"flash flash-warning\">{}</div>",
            encode_text(tr("filter_no_results"))
        ));
    } else {
        for recipe in &ctx.recipes {
            let armed = recipe
                .id_key()
                .map(|key| ctx.pending_delete.contains(&key))
                .unwrap_or(false);
            out.push_str(&recipe_card(
                recipe,
                &CardOptions {
                    show_delete: true,
                    armed,
                    from: &ctx.from,
                },
            ));
        }
    }

    page(Tab::Browse, &out)
}

/// The search tab.
pub(crate) fn search_page(
    query: &str,
    results: Option<&[Recipe]>,
    pending_delete: &HashSet<String>,
    flash: Option<&Flash>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("<h2>{}</h2>", encode_text(tr("search_recipes"))));

    if let Some(flash) = flash {
        out.push_str(&flash_html(flash));
    }

    out.push_str(&format!(
        "<form method=\"get\" action=\"/search\" class=\"search-form\">\n\
         <input type=\"text\" name=\"q\" value=\"{value}\" placeholder=\"{placeholder}\">\n\
         <button type=\"submit\">{button}</button>\n\
         </form>\n",
        value = encode_double_quoted_attribute(query),
        placeholder = encode_double_quoted_attribute(tr("search_placeholder")),
        button = encode_text(tr("search_recipes")),
    ));

    match results {
        None => {
            out.push_str(&format!(
                "<div class=\"flash flash-info\">{}</div>",
                encode_text(tr("search_prompt"))
            ));
        }
        Some([]) => {
            out.push_str(&format!(
                "<div class=\"flash flash-info\">{}</div>",
                encode_text(tr("no_matches"))
            ));
        }
        Some(records) => {
            out.push_str(&format!(
                "<p class=\"count-line\">{} <strong>{}</strong> {}</p>",
                encode_text(tr("found")),
                records.len(),
                encode_text(tr("matching_recipes")),
            ));
            let from = format!(
                "/search?q={}",
                url::form_urlencoded::byte_serialize(query.as_bytes()).collect::<String>()
            );
            for recipe in records {
                let armed = recipe
                    .id_key()
                    .map(|key| pending_delete.contains(&key))
                    .unwrap_or(false);
                out.push_str(&recipe_card(
                    recipe,
                    &CardOptions {
                        show_delete: true,
                        armed,
                        from: &from,
                    },
                ));
            }
        }
    }

    page(Tab::Search, &out)
}

/// One recipe card: title, image (or a placeholder carrying the title),
/// metadata, ingredients, instructions, tags, source link, and the
/// two-step delete controls when requested.
pub(crate) fn recipe_card(recipe: &Recipe, options: &CardOptions<'_>) -> String {
    let title = recipe.display_title();
    let mut out = String::from("<article class=\"recipe-card\">\n");
    out.push_str(&format!(
        "<h3 class=\"recipe-title\">{}</h3>\n",
        encode_text(title)
    ));

    out.push_str(&card_image(recipe, title));

    if let Some(description) = &recipe.description {
        out.push_str(&format!(
            "<p class=\"recipe-description\">{}</p>\n",
            encode_text(description)
        ));
    }

    let metadata = metadata_items(recipe);
    if !metadata.is_empty() {
        out.push_str("<ul class=\"recipe-metadata\">");
        for item in metadata {
            out.push_str(&format!("<li>{}</li>", encode_text(&item)));
        }
        out.push_str("</ul>\n");
    }

    if !recipe.ingredients.is_empty() {
        out.push_str(&format!(
            "<h5>{}</h5>\n<ul class=\"recipe-ingredients\">",
            encode_text(tr("ingredients"))
        ));
        for ingredient in recipe.ingredients.iter().filter(|i| !i.trim().is_empty()) {
            out.push_str(&format!("<li>{}</li>", encode_text(ingredient)));
        }
        out.push_str("</ul>\n");
    }

    if !recipe.instructions.is_empty() {
        out.push_str(&format!(
            "<h5>{}</h5>\n<ol class=\"recipe-instructions\">",
            encode_text(tr("instructions"))
        ));
        for step in recipe.instructions.iter().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("<li>{}</li>", encode_text(step)));
        }
        out.push_str("</ol>\n");
    }

    let tags: Vec<&str> = recipe
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if !tags.is_empty() {
        out.push_str(&format!("<h5>{}</h5>\n", encode_text(tr("tags"))));
        out.push_str("<div class=\"recipe-tags\">");
        for tag in tags {
            out.push_str(&format!(
                "<span class=\"recipe-tag\">{}</span> ",
                encode_text(tag)
            ));
        }
        out.push_str("</div>\n");
    }

    if let Some(source_url) = &recipe.source_url {
        out.push_str(&format!(
            "<div class=\"source-link\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></div>\n",
            encode_double_quoted_attribute(source_url),
            encode_text(tr("view_original")),
        ));
    }

    if options.show_delete {
        if let Some(key) = recipe.id_key() {
            out.push_str(&delete_controls(&key, title, options));
        }
    }

    out.push_str("</article>\n");
    out
}

fn card_image(recipe: &Recipe, title: &str) -> String {
    if let Some(image_url) = recipe
        .image_url
        .as_deref()
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
    {
        let proxied = format!(
            "/img?u={}",
            url::form_urlencoded::byte_serialize(image_url.as_bytes()).collect::<String>()
        );
        return format!(
            "<img class=\"recipe-image\" src=\"{}\" alt=\"{}\">\n",
            encode_double_quoted_attribute(&proxied),
            encode_double_quoted_attribute(title),
        );
    }
    if let Some(data_uri) = recipe.image_data_b64.as_deref().and_then(data_uri) {
        return format!(
            "<img class=\"recipe-image\" src=\"{}\" alt=\"{}\">\n",
            data_uri,
            encode_double_quoted_attribute(title),
        );
    }
    // No usable image: a styled placeholder that still names the dish.
    format!(
        "<div class=\"image-placeholder\">🍲<span>{}</span></div>\n",
        encode_text(title)
    )
}

/// Inline data URI for a manually uploaded image; the MIME type is sniffed
/// from the decoded bytes since only the base64 payload is stored.
fn data_uri(b64: &str) -> Option<String> {
    let bytes = STANDARD.decode(b64).ok()?;
    let format = image::guess_format(&bytes).ok()?;
    Some(format!("data:{};base64,{b64}", format.to_mime_type()))
}

fn metadata_items(recipe: &Recipe) -> Vec<String> {
    let mut items = Vec::new();
    if let Some(value) = &recipe.prep_time {
        items.push(format!("⏱️ {}: {value}", tr("prep_time")));
    }
    if let Some(value) = &recipe.cook_time {
        items.push(format!("🔥 {}: {value}", tr("cook_time")));
    }
    if let Some(value) = &recipe.total_time {
        items.push(format!("⌛ {}: {value}", tr("total_time")));
    }
    if let Some(value) = &recipe.servings {
        items.push(format!("👥 {}: {value}", tr("serves")));
    }
    if let Some(value) = &recipe.cuisine {
        items.push(format!("🌍 {}: {value}", tr("cuisine")));
    }
    if let Some(value) = &recipe.meal_type {
        items.push(format!("🍽️ {}: {value}", tr("meal_type")));
    }
    items
}

fn delete_controls(key: &str, title: &str, options: &CardOptions<'_>) -> String {
    let from = encode_double_quoted_attribute(options.from);
    if options.armed {
        format!(
            "<div class=\"delete-confirm\">\n\
             <p class=\"flash flash-warning\">⚠️ {question}</p>\n\
             <form method=\"post\" action=\"/recipes/{key}/confirm\">\
             <input type=\"hidden\" name=\"from\" value=\"{from}\">\
             <button type=\"submit\" class=\"primary\">{yes}</button></form>\n\
             <form method=\"post\" action=\"/recipes/{key}/cancel\">\
             <input type=\"hidden\" name=\"from\" value=\"{from}\">\
             <button type=\"submit\">{cancel}</button></form>\n\
             </div>\n",
            question = encode_text(&tr_title("confirm_delete", title)),
            yes = encode_text(tr("yes_delete")),
            cancel = encode_text(tr("cancel")),
        )
    } else {
        format!(
            "<form method=\"post\" action=\"/recipes/{key}/delete\" class=\"delete-form\">\
             <input type=\"hidden\" name=\"from\" value=\"{from}\">\
             <button type=\"submit\" class=\"secondary\">{label}</button></form>\n",
            label = encode_text(tr("delete_recipe")),
        )
    }
}

fn sort_options(selected: SortOrder) -> String {
    [
        (SortOrder::Newest, tr("newest_first")),
        (SortOrder::Oldest, tr("oldest_first")),
        (SortOrder::Title, tr("title_az")),
    ]
    .into_iter()
    .map(|(order, label)| {
        let marker = if order == selected { " selected" } else { "" };
        format!(
            "<option value=\"{}\"{marker}>{}</option>",
            order.as_str(),
            encode_text(label)
        )
    })
    .collect()
}

fn filter_options(values: &[String], selected: Option<&str>) -> String {
    let mut out = format!("<option value=\"\">{}</option>", encode_text(tr("all")));
    for value in values {
        let marker = if selected == Some(value.as_str()) {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "<option value=\"{}\"{marker}>{}</option>",
            encode_double_quoted_attribute(value),
            encode_text(value)
        ));
    }
    out
}

fn hidden_inputs(pairs: &[(&str, Option<&str>)]) -> String {
    pairs
        .iter()
        .filter_map(|(name, value)| {
            value.map(|value| {
                format!(
                    "<input type=\"hidden\" name=\"{name}\" value=\"{}\">",
                    encode_double_quoted_attribute(value)
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> Recipe {
        Recipe {
            title: Some("עוגת שוקולד".to_string()),
            description: Some("Rich and easy".to_string()),
            prep_time: Some("15 minutes".to_string()),
            ingredients: vec!["flour".to_string(), "cocoa".to_string()],
            instructions: vec!["mix".to_string(), "bake".to_string()],
            keywords: vec!["dessert".to_string(), "  ".to_string()],
            source_url: Some("https://example.com/cake".to_string()),
            image_url: Some("https://example.com/cake.jpg".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_card_shows_title_and_lists() {
        let html = recipe_card(&sample_recipe(), &CardOptions::default());
        assert!(html.contains("עוגת שוקולד"));
        assert!(html.contains("<li>flour</li>"));
        assert!(html.contains("<ol class=\"recipe-instructions\">"));
        // Blank keywords are filtered out.
        assert_eq!(html.matches("recipe-tag\"").count(), 1);
    }

    #[test]
    fn test_card_image_goes_through_the_cache_proxy() {
        let html = recipe_card(&sample_recipe(), &CardOptions::default());
        assert!(html.contains("/img?u=https%3A%2F%2Fexample.com%2Fcake.jpg"));
    }

    #[test]
    fn test_card_without_image_renders_placeholder_with_title() {
        let mut recipe = sample_recipe();
        recipe.image_url = None;
        let html = recipe_card(&recipe, &CardOptions::default());
        assert!(html.contains("image-placeholder"));
        assert!(html.contains("עוגת שוקולד"));
    }

    #[test]
    fn test_card_escapes_html_in_model_output() {
        let mut recipe = sample_recipe();
        recipe.title = Some("<script>alert(1)</script>".to_string());
        let html = recipe_card(&recipe, &CardOptions::default());
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_delete_controls_two_step() {
        let mut recipe = sample_recipe();
        recipe.id = Some(surrealdb::RecordId::from_table_key("recipe", "abc123"));

        let disarmed = recipe_card(
            &recipe,
            &CardOptions {
                show_delete: true,
                armed: false,
                from: "/recipes",
            },
        );
        assert!(disarmed.contains("/recipes/abc123/delete"));
        assert!(!disarmed.contains("/recipes/abc123/confirm"));

        let armed = recipe_card(
            &recipe,
            &CardOptions {
                show_delete: true,
                armed: true,
                from: "/recipes",
            },
        );
        assert!(armed.contains("/recipes/abc123/confirm"));
        assert!(armed.contains("/recipes/abc123/cancel"));
        assert!(armed.contains("עוגת שוקולד"));
    }

    #[test]
    fn test_page_shell_is_rtl_hebrew() {
        let html = page(Tab::Add, "<p>hi</p>");
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("lang=\"he\""));
        assert!(html.contains(tr("app_title")));
    }
}
