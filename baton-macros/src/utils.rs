use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
///
/// This function does **not** attempt to handle nested structures;
/// generic arguments containing commas (`Map<K, V>`) are split apart.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens into a Rust source string.
///
/// Spaces are inserted between consecutive identifiers to avoid
/// accidental token merging (e.g. `mut co` vs `mutco`).
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let s = t.to_string();

        let needs_space = prev_was_ident && matches!(t, TokenTree::Ident(_));

        if needs_space {
            out.push(' ');
        }

        out.push_str(&s);
        prev_was_ident = matches!(t, TokenTree::Ident(_));
    }

    out
}

/// What a parameter of an entry point is bound to.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// The coroutine manager.
    Manager,
    /// The identity of the entry point's own logical thread.
    Thread,
}

/// A parameter of an entry point, rendered back to source.
pub(crate) struct Param {
    pub(crate) role: Role,
    /// Pattern, e.g. `co` or `mut co`.
    pub(crate) pattern: String,
    /// Type as written by the user.
    pub(crate) ty: String,
}

/// Parses the parameter list of an entry point.
///
/// Each parameter must have the form `pattern: Type`, where the type
/// names either `Coroutines` or `Thread`.
///
/// Parameters are split at every comma (see [`split_args`]), so a type
/// with several generic arguments is rejected as a malformed parameter.
/// Entry points only take `Coroutines<()>` and `Thread<()>`, which never
/// need one.
pub(crate) fn parse_params(input: TokenStream) -> Result<Vec<Param>, String> {
    let mut params = Vec::new();

    for arg in split_args(input) {
        let Some(colon) = arg
            .iter()
            .position(|t| matches!(t, TokenTree::Punct(p) if p.as_char() == ':'))
        else {
            return Err(format!(
                "expected `name: Type`, found `{}`",
                tokens_to_string(&arg)
            ));
        };

        let pattern = tokens_to_string(&arg[..colon]);
        let ty = tokens_to_string(&arg[colon + 1..]);

        let role = if ty.contains("Coroutines") {
            Role::Manager
        } else if ty.contains("Thread") {
            Role::Thread
        } else {
            return Err(format!(
                "parameter `{pattern}` must be a `Coroutines` or a `Thread`"
            ));
        };

        if params.iter().any(|p: &Param| p.role == role) {
            return Err(format!("duplicate parameter of type `{ty}`"));
        }

        params.push(Param { role, pattern, ty });
    }

    Ok(params)
}

/// Entry point settings read from the attribute arguments.
#[derive(Default)]
pub(crate) struct Options {
    pub(crate) name: Option<String>,
    pub(crate) stack_size: Option<usize>,
}

/// Parses `name = "..."` and `stack_size = N` attribute arguments.
///
/// Unknown keys are rejected.
pub(crate) fn parse_options(attr: TokenStream) -> Result<Options, String> {
    let mut options = Options::default();

    for arg in split_args(attr) {
        let text = tokens_to_string(&arg);
        let Some((key, value)) = text.split_once('=') else {
            return Err(format!("expected `key = value`, found `{text}`"));
        };

        match key.trim() {
            "name" => options.name = Some(value.trim().trim_matches('"').to_owned()),
            "stack_size" => {
                let value = value.trim().replace('_', "");
                match value.parse::<usize>() {
                    Ok(n) if n > 0 => options.stack_size = Some(n),
                    _ => return Err(format!("invalid stack_size `{value}`")),
                }
            }
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    Ok(options)
}

/// Returns the position of the function's parameter list, i.e. the first
/// parenthesized group after the `fn` keyword.
pub(crate) fn find_params(tokens: &[TokenTree]) -> Option<usize> {
    let fn_pos = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"))?;

    tokens
        .iter()
        .skip(fn_pos)
        .position(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Parenthesis))
        .map(|offset| fn_pos + offset)
}

/// Returns the declared return type from the tokens between the parameter
/// list and the body, if any. A `where` clause ends the type.
pub(crate) fn return_type(tokens: &[TokenTree]) -> Option<String> {
    let is_arrow = matches!(
        tokens,
        [TokenTree::Punct(p1), TokenTree::Punct(p2), ..]
            if p1.as_char() == '-' && p2.as_char() == '>'
    );

    if !is_arrow {
        return None;
    }

    let ty: Vec<TokenTree> = tokens[2..]
        .iter()
        .take_while(|t| !matches!(t, TokenTree::Ident(id) if id.to_string() == "where"))
        .cloned()
        .collect();

    Some(tokens_to_string(&ty))
}

/// Returns the position of the function body.
pub(crate) fn find_body(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Expands to a `compile_error!` carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});").parse().unwrap()
}
