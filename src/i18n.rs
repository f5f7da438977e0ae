/*
Simple i18n helper for the backend.

This module provides:
- A tiny embedded translations store for PT/EN (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- A `t` convenience wrapper using the default language (DEFAULT_LANG).

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `pt`. If a key is missing for the requested language,
  the fallback language will be used.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "pt";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const PT_JSON: &str = r#"
{
  "auth.logged_out": "Sessão terminada",
  "validation.username_required": "O nome de utilizador é obrigatório",
  "validation.username_taken": "Esse nome de utilizador já existe",
  "validation.secret_required": "A palavra-passe é obrigatória",
  "validation.list_name_required": "O nome da lista é obrigatório",
  "validation.duplicate_list": "Já existe uma lista com o nome \"{name}\"",
  "share.self_share": "Não pode partilhar uma lista consigo próprio",
  "share.user_not_found": "Utilizador \"{username}\" não encontrado",
  "share.already_shared": "A lista já está partilhada com {username}",
  "share.created": "Lista partilhada com {username}",
  "share.accepted": "Juntou-se à lista \"{name}\"",
  "share.rejected": "Convite ignorado",
  "share.link_gone": "O link de partilha já não é válido",
  "share.no_pending": "Não há nenhum convite pendente",
  "not_found.list": "Lista não encontrada",
  "not_found.item": "Artigo não encontrado",
  "not_found.link": "Link não encontrado",
  "not_found.member": "Partilha não encontrada",
  "app.name": "Compras"
}
"#;

const EN_JSON: &str = r#"
{
  "auth.logged_out": "Logged out",
  "validation.username_required": "Username is required",
  "validation.username_taken": "That username is already taken",
  "validation.secret_required": "Password is required",
  "validation.list_name_required": "List name is required",
  "validation.duplicate_list": "A list named \"{name}\" already exists",
  "share.self_share": "You cannot share a list with yourself",
  "share.user_not_found": "User \"{username}\" not found",
  "share.already_shared": "List already shared with {username}",
  "share.created": "List shared with {username}",
  "share.accepted": "Joined list \"{name}\"",
  "share.rejected": "Invitation dismissed",
  "share.link_gone": "The share link is no longer valid",
  "share.no_pending": "There is no pending invitation",
  "not_found.list": "List not found",
  "not_found.item": "Item not found",
  "not_found.link": "Link not found",
  "not_found.member": "Share not found",
  "app.name": "Compras"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let pt_map: HashMap<String, String> = serde_json::from_str(PT_JSON).unwrap_or_else(|e| {
        panic!("failed to parse PT_JSON in i18n module: {}", e);
    });
    out.insert("pt".to_string(), pt_map);

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Translate a key using an explicit language (or default if None).
///
/// - `lang`: optional language code (`"pt"`, `"en"`, ...). If None, DEFAULT_LANG is used.
/// - `key`: translation key (flat string, e.g. "share.already_shared").
/// - `params`: optional slice of (name, value) for placeholder replacement.
///
/// Returns the translated and parameter-substituted string. If no translation is found,
/// returns a sensible fallback (default language value or the key itself).
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        // Fallback to default language
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        // If still missing, return the key itself (useful in logs)
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}

/// Convenience wrapper with params (default language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tr_basic() {
        let s = tr(Some("en"), "share.self_share", None);
        assert!(s.contains("yourself"));
    }

    #[test]
    fn test_t_with_params() {
        let s = t_with("share.created", &[("username", "maria")]);
        assert!(s.contains("maria"));
    }

    #[test]
    fn test_fallback_to_default() {
        // Unknown language falls back to default (pt)
        let s = tr(Some("fr"), "not_found.list", None);
        assert_eq!(s, "Lista não encontrada");
    }

    #[test]
    fn missing_key_returns_key() {
        let k = "non.existent.key";
        let s = t(k);
        assert_eq!(s, k.to_string());
    }
}
