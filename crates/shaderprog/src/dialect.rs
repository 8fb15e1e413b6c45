//! Desktop OpenGL GLSL rewritten into the Vulkan flavour naga's GLSL
//! frontend accepts.
//!
//! Sources written for a GL driver lean on three things naga rejects:
//! default-block uniforms without a `binding`, combined `sampler2D`-style
//! uniforms, and stage inputs/outputs without a `location`. Each declaration
//! is rewritten in place and keeps its line, so naga's diagnostics still
//! point at the caller's line numbers. Only a missing `#version` line adds
//! one line at the top.
//!
//! Every stage input and output is also recorded by name, since that is how
//! GL matches unlocated varyings across stages.
use std::collections::BTreeSet;
use std::ops::Range;

use crate::stage::StageKind;

/// Appended to a combined sampler's name for its synthesised sampler object.
pub(crate) const SAMPLER_STATE_SUFFIX: &str = "_sampler_state";

const VERSION: &str = "#version 450";

const QUALIFIERS: &[&str] = &[
    "flat",
    "smooth",
    "noperspective",
    "centroid",
    "sample",
    "patch",
    "invariant",
    "precise",
    "highp",
    "mediump",
    "lowp",
    "coherent",
    "volatile",
    "restrict",
    "readonly",
    "writeonly",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    In,
    Out,
}

/// A global `in`/`out` variable of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Varying {
    pub name: String,
    pub direction: Direction,
    /// Type as written plus any array suffix, e.g. `vec3` or `float[4]`.
    pub ty: String,
    /// Set only when the source wrote `layout(location = N)` itself.
    pub explicit_location: Option<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct Translated {
    pub source: String,
    pub varyings: Vec<Varying>,
    /// Default-block uniform names in declaration order.
    pub uniforms: Vec<String>,
}

pub(crate) fn translate(kind: StageKind, source: &str) -> Result<Translated, String> {
    let code = strip_comments(source);
    let scan = scan(&code);
    let declarations: Vec<Declaration> = scan
        .statements
        .iter()
        .filter_map(|range| parse_declaration(kind, &code, range.clone()))
        .collect();

    let mut next_binding = declarations
        .iter()
        .filter_map(|decl| decl.layout_value("binding"))
        .max()
        .map_or(0, |binding| binding + 1);
    let mut used_inputs = BTreeSet::new();
    let mut used_outputs = BTreeSet::new();
    for decl in &declarations {
        if let (Body::Variables { ty, declarators }, Some(location)) =
            (&decl.body, decl.layout_value("location"))
        {
            if let [declarator] = declarators.as_slice() {
                let used = match decl.storage {
                    Storage::In => &mut used_inputs,
                    Storage::Out => &mut used_outputs,
                    _ => continue,
                };
                let width = location_width(ty, declarator.array.as_deref());
                used.extend(location..location + width);
            }
        }
    }

    let mut translated = Translated::default();
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut combined: Vec<(String, String)> = Vec::new();

    for decl in &declarations {
        match &decl.body {
            Body::Block => {
                if matches!(decl.storage, Storage::Uniform | Storage::Buffer)
                    && decl.layout_value("binding").is_none()
                {
                    let binding = next_binding;
                    next_binding += 1;
                    let edit = match &decl.layout_span {
                        Some(span) => (
                            span.clone(),
                            render_layout(&decl.layout, "binding", binding)
                                .trim_end()
                                .to_string(),
                        ),
                        None => (
                            decl.range.start..decl.range.start,
                            format!("layout(binding = {binding}) "),
                        ),
                    };
                    edits.push(edit);
                }
            }
            Body::Variables { ty, declarators } if decl.storage == Storage::Uniform => {
                let keep_binding = declarators.len() == 1 && decl.layout_value("binding").is_some();
                let mut text = String::new();
                for declarator in declarators {
                    let name = &declarator.name;
                    translated.uniforms.push(name.clone());
                    if let Some((texture, state)) = split_combined_sampler(ty) {
                        if declarator.array.is_some() {
                            return Err(format!(
                                "line {}: arrays of {ty} (`{name}`) are not supported without a GPU",
                                line_of(&code, decl.range.start)
                            ));
                        }
                        let binding = next_binding;
                        next_binding += 2;
                        text.push_str(&format!(
                            "layout(binding = {binding}) uniform {texture} {name}; \
                             layout(binding = {}) uniform {state} {name}{SAMPLER_STATE_SUFFIX}; ",
                            binding + 1
                        ));
                        combined.push((name.clone(), ty.clone()));
                        continue;
                    }

                    let layout = if keep_binding {
                        render_layout(&decl.layout, "", 0)
                    } else {
                        let binding = next_binding;
                        next_binding += 1;
                        render_layout(&decl.layout, "binding", binding)
                    };
                    text.push_str(&decl.render(&layout, "uniform", ty, declarator));
                }
                edits.push((decl.range.clone(), keep_lines(text, &code[decl.range.clone()])));
            }
            Body::Variables { ty, declarators } => {
                let (direction, keyword, used) = match decl.storage {
                    Storage::In => (Direction::In, "in", &mut used_inputs),
                    Storage::Out => (Direction::Out, "out", &mut used_outputs),
                    Storage::Uniform | Storage::Buffer => continue,
                };
                let explicit = decl
                    .layout_value("location")
                    .filter(|_| declarators.len() == 1);
                let mut text = String::new();
                for declarator in declarators {
                    let location = match explicit {
                        Some(location) => location,
                        None => next_free(used, location_width(ty, declarator.array.as_deref())),
                    };
                    translated.varyings.push(Varying {
                        name: declarator.name.clone(),
                        direction,
                        ty: match &declarator.array {
                            Some(len) => format!("{ty}[{len}]"),
                            None => ty.clone(),
                        },
                        explicit_location: explicit,
                    });
                    let layout = render_layout(&decl.layout, "location", location);
                    text.push_str(&decl.render(&layout, keyword, ty, declarator));
                }
                edits.push((decl.range.clone(), keep_lines(text, &code[decl.range.clone()])));
            }
        }
    }

    if !combined.is_empty() {
        let tokens = tokenize(&code, 0..code.len());
        let excluded = |pos: usize| {
            edits.iter().any(|(range, _)| range.contains(&pos))
                || scan.directives.iter().any(|range| range.contains(&pos))
        };
        let mut uses = Vec::new();
        for (index, token) in tokens.iter().enumerate() {
            let Some((name, ty)) = combined.iter().find(|(name, _)| name == token.text) else {
                continue;
            };
            let member = index > 0 && tokens[index - 1].text == ".";
            if member || excluded(token.start) {
                continue;
            }
            uses.push((
                token.start..token.end,
                format!("{ty}({name}, {name}{SAMPLER_STATE_SUFFIX})"),
            ));
        }
        edits.extend(uses);
    }

    let version = scan.directives.iter().find(|range| {
        code[(*range).clone()]
            .trim_start_matches('#')
            .trim_start()
            .starts_with("version")
    });
    match version {
        Some(range) => {
            let line_start = code[..range.start].rfind('\n').map_or(0, |pos| pos + 1);
            edits.push((line_start..range.end, VERSION.to_string()));
        }
        None => edits.push((0..0, format!("{VERSION}\n"))),
    }

    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(code.len() + 64 * edits.len());
    let mut cursor = 0;
    for (range, text) in edits {
        out.push_str(&code[cursor..range.start]);
        out.push_str(&text);
        cursor = range.end;
    }
    out.push_str(&code[cursor..]);
    translated.source = out;
    Ok(translated)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Uniform,
    Buffer,
    In,
    Out,
}

#[derive(Debug)]
struct LayoutItem {
    key: String,
    value: Option<String>,
}

#[derive(Debug)]
struct Declarator {
    name: String,
    array: Option<String>,
}

#[derive(Debug)]
enum Body {
    Block,
    Variables {
        ty: String,
        declarators: Vec<Declarator>,
    },
}

/// A global declaration with a storage qualifier.
#[derive(Debug)]
struct Declaration {
    range: Range<usize>,
    layout: Vec<LayoutItem>,
    layout_span: Option<Range<usize>>,
    before: Vec<String>,
    after: Vec<String>,
    storage: Storage,
    body: Body,
}

impl Declaration {
    fn layout_value(&self, key: &str) -> Option<u32> {
        self.layout
            .iter()
            .find(|item| item.key == key)
            .and_then(|item| item.value.as_deref()?.parse().ok())
    }

    fn render(&self, layout: &str, keyword: &str, ty: &str, declarator: &Declarator) -> String {
        let mut text = layout.to_string();
        for qualifier in &self.before {
            text.push_str(qualifier);
            text.push(' ');
        }
        text.push_str(keyword);
        text.push(' ');
        for qualifier in &self.after {
            text.push_str(qualifier);
            text.push(' ');
        }
        text.push_str(ty);
        text.push(' ');
        text.push_str(&declarator.name);
        if let Some(len) = &declarator.array {
            text.push('[');
            text.push_str(len);
            text.push(']');
        }
        text.push_str("; ");
        text
    }
}

/// Renders `layout(...) ` with `key` forced to `value`; an empty `key` keeps
/// the items as they are.
fn render_layout(items: &[LayoutItem], key: &str, value: u32) -> String {
    let mut parts: Vec<String> = items
        .iter()
        .filter(|item| item.key != key)
        .map(|item| match &item.value {
            Some(value) => format!("{} = {value}", item.key),
            None => item.key.clone(),
        })
        .collect();
    if !key.is_empty() {
        parts.push(format!("{key} = {value}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("layout({}) ", parts.join(", "))
    }
}

fn parse_declaration(kind: StageKind, code: &str, range: Range<usize>) -> Option<Declaration> {
    let tokens = tokenize(code, range.clone());
    let mut cursor = 0;

    let mut layout = Vec::new();
    let mut layout_span = None;
    if tokens.first()?.text == "layout" {
        if tokens.get(1)?.text != "(" {
            return None;
        }
        let close = tokens.iter().skip(2).position(|token| token.text == ")")? + 2;
        layout = parse_layout(&tokens[2..close]);
        layout_span = Some(tokens[0].start..tokens[close].end);
        cursor = close + 1;
    }

    let before = take_qualifiers(&tokens, &mut cursor);
    let storage = match (tokens.get(cursor)?.text, kind) {
        ("uniform", _) => Storage::Uniform,
        ("buffer", _) => Storage::Buffer,
        ("in", _) | ("attribute", StageKind::Vertex) => Storage::In,
        ("out", _) | ("varying", StageKind::Vertex) => Storage::Out,
        ("varying", _) => Storage::In,
        _ => return None,
    };
    cursor += 1;
    let after = take_qualifiers(&tokens, &mut cursor);

    let ty = tokens.get(cursor)?;
    if !is_identifier(ty.text) {
        return None;
    }
    cursor += 1;

    let body = if tokens.get(cursor)?.text == "{" {
        Body::Block
    } else if storage == Storage::Buffer {
        return None;
    } else {
        let mut declarators = Vec::new();
        loop {
            let name = tokens.get(cursor)?;
            if !is_identifier(name.text) || name.text.starts_with("gl_") {
                return None;
            }
            cursor += 1;
            let mut array = None;
            if tokens.get(cursor)?.text == "[" {
                let close = tokens[cursor..]
                    .iter()
                    .position(|token| token.text == "]")?
                    + cursor;
                array = Some(join(&tokens[cursor + 1..close]));
                cursor = close + 1;
            }
            declarators.push(Declarator {
                name: name.text.to_string(),
                array,
            });
            match tokens.get(cursor)?.text {
                "," => cursor += 1,
                ";" => break,
                // Initialisers and anything stranger reach naga untouched.
                _ => return None,
            }
        }
        Body::Variables {
            ty: ty.text.to_string(),
            declarators,
        }
    };

    Some(Declaration {
        range,
        layout,
        layout_span,
        before,
        after,
        storage,
        body,
    })
}

fn parse_layout(tokens: &[Token<'_>]) -> Vec<LayoutItem> {
    tokens
        .split(|token| token.text == ",")
        .filter_map(|item| {
            let key = item.first()?.text.to_string();
            let value = match item.get(1) {
                Some(token) if token.text == "=" => Some(join(&item[2..])),
                _ => None,
            };
            Some(LayoutItem { key, value })
        })
        .collect()
}

fn take_qualifiers(tokens: &[Token<'_>], cursor: &mut usize) -> Vec<String> {
    let mut qualifiers = Vec::new();
    while let Some(token) = tokens.get(*cursor) {
        if !QUALIFIERS.contains(&token.text) {
            break;
        }
        qualifiers.push(token.text.to_string());
        *cursor += 1;
    }
    qualifiers
}

/// `sampler2D` becomes a `texture2D` plus a `sampler`, `isampler3D` an
/// `itexture3D` plus a `sampler`, shadow samplers pair with `samplerShadow`.
fn split_combined_sampler(ty: &str) -> Option<(String, &'static str)> {
    let (prefix, rest) = if let Some(rest) = ty.strip_prefix("isampler") {
        ("i", rest)
    } else if let Some(rest) = ty.strip_prefix("usampler") {
        ("u", rest)
    } else {
        ("", ty.strip_prefix("sampler")?)
    };
    let (dim, state) = match rest.strip_suffix("Shadow") {
        Some(dim) => (dim, "samplerShadow"),
        None => (rest, "sampler"),
    };
    match dim {
        "1D" | "2D" | "3D" | "Cube" | "1DArray" | "2DArray" | "CubeArray" | "2DMS"
        | "2DMSArray" => Some((format!("{prefix}texture{dim}"), state)),
        _ => None,
    }
}

/// Locations a variable of `ty` occupies: one per vector, one per matrix
/// column, times the array length.
fn location_width(ty: &str, array: Option<&str>) -> u32 {
    let columns = match ty.trim_start_matches('d') {
        "mat2" => 2,
        "mat3" => 3,
        "mat4" => 4,
        matrix if matrix.starts_with("mat") => matrix
            .get(3..4)
            .and_then(|columns| columns.parse().ok())
            .unwrap_or(1),
        _ => 1,
    };
    let count = array.and_then(|len| len.parse().ok()).unwrap_or(1);
    columns * count
}

fn next_free(used: &mut BTreeSet<u32>, width: u32) -> u32 {
    let mut location = 0;
    while (location..location + width).any(|slot| used.contains(&slot)) {
        location += 1;
    }
    used.extend(location..location + width);
    location
}

/// Pads a rewritten declaration with the newlines of the text it replaces.
fn keep_lines(mut text: String, original: &str) -> String {
    let text_len = text.trim_end().len();
    text.truncate(text_len);
    for _ in 0..original.matches('\n').count() {
        text.push('\n');
    }
    text
}

fn line_of(code: &str, pos: usize) -> usize {
    code[..pos].matches('\n').count() + 1
}

#[derive(Debug, Default)]
struct Scan {
    directives: Vec<Range<usize>>,
    /// Global statements ending in `;`. Function bodies are skipped.
    statements: Vec<Range<usize>>,
}

fn scan(code: &str) -> Scan {
    let bytes = code.as_bytes();
    let mut scan = Scan::default();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;
    let mut function = false;
    let mut line_blank = true;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\n' {
            line_blank = true;
            i += 1;
            continue;
        }
        if byte == b'#' && line_blank {
            let end = directive_end(bytes, i);
            scan.directives.push(i..end);
            i = end;
            continue;
        }
        if !byte.is_ascii_whitespace() {
            line_blank = false;
        }

        match byte {
            b'{' => {
                if depth == 0 {
                    let head = start.map_or("", |start| code[start..i].trim_end());
                    function = head.ends_with(')');
                    if start.is_none() {
                        start = Some(i);
                    }
                }
                depth += 1;
            }
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && function {
                    start = None;
                    function = false;
                }
            }
            b';' if depth == 0 => {
                if let Some(start) = start.take() {
                    scan.statements.push(start..i + 1);
                }
            }
            _ if depth == 0 && start.is_none() && !byte.is_ascii_whitespace() => {
                start = Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    scan
}

/// End of a preprocessor directive, honouring `\` line continuations.
fn directive_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'\n' && (i == 0 || bytes[i - 1] != b'\\') {
            return i;
        }
        i += 1;
    }
    i
}

/// Blanks comments with spaces so byte offsets and line numbers survive.
fn strip_comments(source: &str) -> String {
    fn blank(out: &mut String, c: char) {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('/', Some('/')) => {
                chars.next();
                out.push_str("  ");
                while let Some(next) = chars.peek().copied() {
                    if next == '\n' {
                        break;
                    }
                    blank(&mut out, next);
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        out.push(' ');
                        break;
                    }
                    blank(&mut out, next);
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn tokenize(code: &str, range: Range<usize>) -> Vec<Token<'_>> {
    let bytes = code.as_bytes();
    let mut tokens = Vec::new();
    let mut i = range.start;
    while i < range.end {
        let byte = bytes[i];
        if byte.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if is_ident_byte(byte) {
            while i < range.end && is_ident_byte(bytes[i]) {
                i += 1;
            }
        } else {
            i += code[i..].chars().next().map_or(1, char::len_utf8);
        }
        tokens.push(Token {
            text: &code[start..i],
            start,
            end: i,
        });
    }
    tokens
}

fn join(tokens: &[Token<'_>]) -> String {
    tokens.iter().map(|token| token.text).collect()
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn is_identifier(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURED_VERTEX: &str = r"
    #version 460 core
    layout (location = 0) in vec3 aPos;
    layout (location = 1) in vec3 aColor;
    layout (location = 2) in vec2 aTexCoord;

    out vec3 ourColor;
    out vec2 TexCoord;

    void main()
    {
        gl_Position = vec4(aPos, 1.0);
        ourColor = aColor;
        TexCoord = aTexCoord;
    }
";

    const TEXTURED_FRAGMENT: &str = r"
    #version 460 core
    out vec4 FragColor;

    in vec3 ourColor;
    in vec2 TexCoord;

    uniform sampler2D texture1;
    uniform sampler2D texture2;

    void main()
    {
        FragColor = mix(texture(texture1, TexCoord), texture(texture2, TexCoord), 0.2);
    }
";

    #[test]
    fn loose_uniforms_get_bindings() {
        let translated = translate(
            StageKind::Fragment,
            "#version 330 core\nout vec4 FragColor;\nuniform vec4 ourColor;\nvoid main() { FragColor = ourColor; }\n",
        )
        .unwrap();
        assert!(translated.source.starts_with("#version 450\n"));
        assert!(translated
            .source
            .contains("layout(binding = 0) uniform vec4 ourColor;"));
        assert!(translated
            .source
            .contains("layout(location = 0) out vec4 FragColor;"));
        assert_eq!(translated.uniforms, vec!["ourColor".to_string()]);
    }

    #[test]
    fn explicit_bindings_and_locations_are_kept() {
        let translated = translate(
            StageKind::Vertex,
            "#version 450\nlayout(location = 1) in vec3 aPos;\nin vec2 aUv;\nlayout(binding = 3) uniform mat4 model;\nuniform mat4 view;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(translated.source.contains("layout(binding = 3) uniform mat4 model;"));
        assert!(translated.source.contains("layout(binding = 4) uniform mat4 view;"));
        assert!(translated.source.contains("layout(location = 0) in vec2 aUv;"));

        let explicit: Vec<_> = translated
            .varyings
            .iter()
            .map(|varying| (varying.name.as_str(), varying.explicit_location))
            .collect();
        assert_eq!(explicit, vec![("aPos", Some(1)), ("aUv", None)]);
    }

    #[test]
    fn unlocated_varyings_skip_matrix_columns() {
        let translated = translate(
            StageKind::Vertex,
            "#version 450\nin mat4 instance;\nin vec3 aPos;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(translated.source.contains("layout(location = 4) in vec3 aPos;"));
    }

    #[test]
    fn combined_samplers_are_split() {
        let translated = translate(StageKind::Fragment, TEXTURED_FRAGMENT).unwrap();
        let source = &translated.source;
        assert!(source.contains("layout(binding = 0) uniform texture2D texture1;"));
        assert!(source.contains("layout(binding = 1) uniform sampler texture1_sampler_state;"));
        assert!(source.contains("texture(sampler2D(texture2, texture2_sampler_state), TexCoord)"));
        assert_eq!(translated.uniforms, vec!["texture1", "texture2"]);
    }

    #[test]
    fn sampler_arrays_are_rejected() {
        let err = translate(
            StageKind::Fragment,
            "#version 450\nuniform sampler2D layers[4];\nvoid main() {}\n",
        )
        .unwrap_err();
        assert!(err.contains("layers"), "{err}");
        assert!(err.starts_with("line 2"), "{err}");
    }

    #[test]
    fn varyings_are_recorded_with_types() {
        let translated = translate(StageKind::Vertex, TEXTURED_VERTEX).unwrap();
        let outputs: Vec<_> = translated
            .varyings
            .iter()
            .filter(|varying| varying.direction == Direction::Out)
            .map(|varying| (varying.name.as_str(), varying.ty.as_str()))
            .collect();
        assert_eq!(outputs, vec![("ourColor", "vec3"), ("TexCoord", "vec2")]);
    }

    #[test]
    fn legacy_storage_keywords_become_in_and_out() {
        let vertex = translate(
            StageKind::Vertex,
            "#version 120\nattribute vec3 aPos;\nvarying vec2 vUv;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(vertex.source.contains("layout(location = 0) in vec3 aPos;"));
        assert!(vertex.source.contains("layout(location = 0) out vec2 vUv;"));

        let fragment = translate(
            StageKind::Fragment,
            "#version 120\nvarying vec2 vUv;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(fragment.source.contains("layout(location = 0) in vec2 vUv;"));
    }

    #[test]
    fn uniform_blocks_get_a_binding() {
        let translated = translate(
            StageKind::Vertex,
            "#version 450\nlayout(std140) uniform Matrices {\n    mat4 projection;\n};\nuniform Light { vec3 position; } light;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(translated
            .source
            .contains("layout(std140, binding = 0) uniform Matrices {"));
        assert!(translated
            .source
            .contains("layout(binding = 1) uniform Light {"));
        assert!(translated.uniforms.is_empty());
    }

    #[test]
    fn rewrites_keep_line_numbers() {
        let translated = translate(StageKind::Vertex, TEXTURED_VERTEX).unwrap();
        assert_eq!(
            translated.source.lines().count(),
            TEXTURED_VERTEX.lines().count()
        );
        let line = |source: &str| source.lines().position(|line| line.contains("TexCoord = aTexCoord"));
        assert_eq!(line(&translated.source), line(TEXTURED_VERTEX));
    }

    #[test]
    fn comments_are_ignored() {
        let translated = translate(
            StageKind::Fragment,
            "#version 450\n// uniform vec4 commented;\n/* uniform float\n   alsoCommented; */\nuniform float real;\nvoid main() {}\n",
        )
        .unwrap();
        assert_eq!(translated.uniforms, vec!["real".to_string()]);
        assert_eq!(translated.source.lines().count(), 6);
    }

    #[test]
    fn compute_layout_declarations_pass_through() {
        let translated = translate(
            StageKind::Compute,
            "#version 450\nlayout(local_size_x = 8) in;\nvoid main() {}\n",
        )
        .unwrap();
        assert!(translated.source.contains("layout(local_size_x = 8) in;"));
        assert!(translated.varyings.is_empty());
    }
}
