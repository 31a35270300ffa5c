//! Hebrew display strings for the web UI.
//!
//! The UI is fully right-to-left; every user-facing string lives here so the
//! handlers and views never embed literal copy.

/// Look up the Hebrew text for a message key.
///
/// Unknown keys fall back to the key itself so a missing entry shows up
/// in the UI instead of crashing a render.
pub fn tr(key: &str) -> &str {
    match key {
        "app_title" => "פנקס המתכונים",
        "add_recipe" => "הוספת מתכון",
        "my_recipes" => "המתכונים שלי",
        "search_recipes" => "חיפוש מתכונים",
        "add_from_url" => "מקישור באינטרנט",
        "add_from_image" => "מתמונה",
        "enter_url" => "הכניסו קישור (URL) למתכון:",
        "extract_recipe" => "🔎 חילוץ מתכון",
        "upload_image" => "📷 העלו תמונת מתכון:",
        "extract_from_image" => "🖼️ חילוץ מתכון מהתמונה",
        "recipe_preview" => "תצוגה מקדימה של המתכון:",
        "save_recipe" => "💾 שמירת מתכון",
        "recipe_saved" => "✅ המתכון נשמר בהצלחה!",
        "extraction_failed" => "⚠️ חילוץ המתכון נכשל. בדקו את המקור או נסו שוב.",
        "recipe_collection" => "📖 אוסף המתכונים שלי",
        "refresh_recipes" => "🔄 רענון רשימה",
        "no_recipes" => "עדיין לא נשמרו מתכונים.",
        "you_have" => "יש לכם",
        "saved_recipes" => "מתכונים שמורים.",
        "filter_recipes" => "סינון מתכונים",
        "cuisine" => "מטבח",
        "meal_type" => "סוג ארוחה",
        "all" => "הכל",
        "search_placeholder" => "הקלידו מילות חיפוש (למשל: 'עוגת שוקולד קלה')...",
        "searching" => "🔍 מחפש...",
        "found" => "נמצאו",
        "matching_recipes" => "מתכונים תואמים.",
        "no_matches" => "לא נמצאו מתכונים תואמים לשאילתה שלכם.",
        "ingredients" => "מצרכים",
        "instructions" => "הוראות הכנה",
        "tags" => "תגיות",
        "prep_time" => "זמן הכנה",
        "cook_time" => "זמן בישול",
        "total_time" => "זמן כולל",
        "serves" => "מספר מנות",
        "view_original" => "🔗 צפייה במתכון המקורי",
        "processing" => "⏳ מעבד...",
        "recipe_extracted" => "👍 המתכון חולץ בהצלחה! בדקו את התצוגה המקדימה ולחצו 'שמירה'.",
        "error_extract_url" => "❌ שגיאה בחילוץ המתכון מהקישור",
        "error_extract_image" => "❌ שגיאה בחילוץ המתכון מהתמונה",
        "error_save" => "❌ שגיאה בשמירת המתכון",
        "error_search" => "❌ שגיאה בחיפוש",
        "error_fetch" => "❌ שגיאה בטעינת המתכונים",
        "delete_recipe" => "🗑️ מחיקת מתכון",
        "confirm_delete" => "האם אתם בטוחים שברצונכם למחוק את המתכון '{title}'?",
        "recipe_deleted" => "🗑️ המתכון '{title}' נמחק בהצלחה!",
        "error_delete" => "❌ שגיאה במחיקת המתכון",
        "sort_by" => "מיון לפי",
        "newest_first" => "החדש ביותר",
        "oldest_first" => "הישן ביותר",
        "title_az" => "שם (א-ת)",
        "enter_url_warning" => "אנא הכניסו קישור למתכון.",
        "img_upload_error" => "שגיאה בעיבוד התמונה:",
        "search_prompt" => "הקלידו מונח חיפוש כדי למצוא מתכונים.",
        "filter_no_results" => "לא נמצאו מתכונים התואמים לסינון.",
        "manual_img_upload" => "לא הצלחנו למצוא תמונה למתכון הזה באופן אוטומטי. אפשר להעלות תמונה ידנית.",
        "upload_img_recipe" => "העלאת תמונה למתכון",
        "img_upload_success" => "התמונה הועלתה בהצלחה!",
        "untitled_recipe" => "מתכון ללא שם",
        "yes_delete" => "כן, למחוק",
        "cancel" => "ביטול",
        other => other,
    }
}

/// Look up a message that carries a recipe title placeholder.
pub fn tr_title(key: &str, title: &str) -> String {
    tr(key).replace("{title}", title)
}
