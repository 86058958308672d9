//! Builds one hidden SVG sprite out of individual icon files, so page
//! markup can reference any icon with `<use href="#name">` instead of
//! inlining it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use actilog_core::{ActilogError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SVG_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<svg\b([^>]*)>(.*?)</svg>").expect("svg element pattern"));
static XMLNS_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\s+xmlns(:\w+)?="[^"]*""#).expect("xmlns attribute pattern"));
static XML_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<\?xml[^>]*>").expect("xml declaration pattern"));
static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!DOCTYPE[^>]*>").expect("doctype pattern"));

const SPRITE_OPEN: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" aria-hidden=\"true\" style=\"position:absolute;width:0;height:0;overflow:hidden;\">";

/// Rewrites one icon file's markup into a `<symbol>` carrying `id`.
/// The namespace attributes move to the sprite wrapper, so they are
/// stripped here. Input without an `<svg>` element yields None.
pub fn symbol_from_svg(id: &str, raw: &str) -> Option<String> {
    let cleaned = raw.trim_start_matches('\u{feff}');
    let cleaned = XML_DECL.replace_all(cleaned, "");
    let cleaned = DOCTYPE.replace_all(&cleaned, "");

    let captures = SVG_ELEMENT.captures(&cleaned)?;
    let raw_attrs = captures.get(1).map_or("", |m| m.as_str());
    let attrs = XMLNS_ATTR.replace_all(raw_attrs, "");
    let attrs = attrs.trim();
    let body = captures.get(2).map_or("", |m| m.as_str()).trim();

    if attrs.is_empty() {
        Some(format!("<symbol id=\"{id}\">{body}</symbol>"))
    } else {
        Some(format!("<symbol id=\"{id}\" {attrs}>{body}</symbol>"))
    }
}

/// Concatenates (file name, contents) pairs into the sprite. Names not
/// ending in `.svg` are skipped, the rest are emitted in sorted name
/// order with the file stem as symbol id.
pub fn build_sprite<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut entries: Vec<(&str, &str)> = entries
        .into_iter()
        .filter(|(name, _)| name.ends_with(".svg"))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut symbols = Vec::new();
    for (name, contents) in entries {
        let stem = name.strip_suffix(".svg").unwrap_or(name);
        if let Some(symbol) = symbol_from_svg(stem, contents) {
            symbols.push(symbol);
        }
    }

    let mut sprite = String::from(SPRITE_OPEN);
    if !symbols.is_empty() {
        sprite.push('\n');
        sprite.push_str(&symbols.join("\n"));
        sprite.push('\n');
    }
    sprite.push_str("</svg>");
    sprite
}

/// Builds the sprite from every `.svg` file directly inside `icons_dir`.
/// A missing directory behaves as an empty one, so themes without icons
/// still get a valid sprite shell.
pub fn build_sprite_from_dir(icons_dir: &Path) -> Result<String> {
    let entries = match fs::read_dir(icons_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(build_sprite(std::iter::empty::<(&str, &str)>()))
        }
        Err(e) => return Err(ActilogError::Io(e.to_string())),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ActilogError::Io(e.to_string()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".svg") {
            continue;
        }
        let contents =
            fs::read_to_string(entry.path()).map_err(|e| ActilogError::Io(e.to_string()))?;
        files.push((name, contents));
    }

    Ok(build_sprite(
        files.iter().map(|(n, c)| (n.as_str(), c.as_str())),
    ))
}

/// Writes the sprite to `<build_dir>/symbol/icons-sprite.svg`, creating
/// the directory.
pub fn write_sprite(build_dir: &Path, sprite: &str) -> Result<PathBuf> {
    let dir = build_dir.join("symbol");
    fs::create_dir_all(&dir).map_err(|e| ActilogError::Io(e.to_string()))?;
    let path = dir.join("icons-sprite.svg");
    fs::write(&path, format!("{sprite}\n")).map_err(|e| ActilogError::Io(e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_keeps_attributes_and_body() {
        let symbol = symbol_from_svg(
            "bell",
            r#"<svg viewBox="0 0 16 16" fill="currentColor"><path d="M8 16"/></svg>"#,
        )
        .unwrap();
        assert_eq!(
            symbol,
            r#"<symbol id="bell" viewBox="0 0 16 16" fill="currentColor"><path d="M8 16"/></symbol>"#
        );
    }

    #[test]
    fn symbol_strips_xmlns_attributes() {
        let symbol = symbol_from_svg(
            "box",
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 8 8"><rect/></svg>"#,
        )
        .unwrap();
        assert_eq!(symbol, r#"<symbol id="box" viewBox="0 0 8 8"><rect/></symbol>"#);
    }

    #[test]
    fn symbol_strips_declaration_doctype_and_bom() {
        let raw = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"svg11.dtd\">\n<svg viewBox=\"0 0 4 4\">\n  <circle r=\"2\"/>\n</svg>\n";
        let symbol = symbol_from_svg("dot", raw).unwrap();
        assert_eq!(symbol, "<symbol id=\"dot\" viewBox=\"0 0 4 4\"><circle r=\"2\"/></symbol>");
    }

    #[test]
    fn symbol_without_attributes_has_no_stray_space() {
        let symbol = symbol_from_svg("plain", "<svg><g/></svg>").unwrap();
        assert_eq!(symbol, r#"<symbol id="plain"><g/></symbol>"#);
    }

    #[test]
    fn non_svg_markup_yields_none() {
        assert!(symbol_from_svg("nope", "<div>not an icon</div>").is_none());
    }

    #[test]
    fn sprite_sorts_by_file_name_and_uses_stems() {
        let sprite = build_sprite([
            ("zoom.svg", "<svg><z/></svg>"),
            ("alarm.svg", "<svg><a/></svg>"),
            ("notes.txt", "<svg><x/></svg>"),
        ]);
        assert_eq!(
            sprite,
            format!(
                "{SPRITE_OPEN}\n<symbol id=\"alarm\"><a/></symbol>\n<symbol id=\"zoom\"><z/></symbol>\n</svg>"
            )
        );
    }

    #[test]
    fn empty_input_builds_bare_shell() {
        let sprite = build_sprite(std::iter::empty::<(&str, &str)>());
        assert_eq!(sprite, format!("{SPRITE_OPEN}</svg>"));
    }

    #[test]
    fn unparseable_icons_are_dropped() {
        let sprite = build_sprite([("bad.svg", "just text"), ("ok.svg", "<svg><p/></svg>")]);
        assert_eq!(
            sprite,
            format!("{SPRITE_OPEN}\n<symbol id=\"ok\"><p/></symbol>\n</svg>")
        );
    }

    #[test]
    fn missing_directory_behaves_as_empty() {
        let sprite = build_sprite_from_dir(Path::new("/definitely/not/here")).unwrap();
        assert_eq!(sprite, format!("{SPRITE_OPEN}</svg>"));
    }
}
