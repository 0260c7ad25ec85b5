mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};
use utils::{Options, Param, Role};

/// Runs `main` as the first logical thread of a fresh coroutine manager.
///
/// The function may take a `Coroutines` and/or a `Thread` parameter,
/// bound to the manager and to its own identity:
///
/// ```rust,ignore
/// #[baton::main(name = "script", stack_size = 262144)]
/// fn main(co: Coroutines, me: Thread) {
///     co.sched(&me);
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    match entry_point(attr, item) {
        Ok(tokens) => tokens,
        Err(msg) => utils::compile_error(&msg),
    }
}

/// Like [`macro@main`], for `#[test]` functions.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let tokens = match entry_point(attr, item) {
        Ok(tokens) => tokens,
        Err(msg) => return utils::compile_error(&msg),
    };

    let test_attr: TokenStream = "#[test]".parse().unwrap();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}

/// Rewrites `fn name(params) { body }` into a parameterless function
/// that runs `body` inside a logical thread and returns its value.
fn entry_point(attr: TokenStream, item: TokenStream) -> Result<TokenStream, String> {
    let options = utils::parse_options(attr)?;
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let params_pos = utils::find_params(&tokens).ok_or("expected a function")?;
    let body_pos = utils::find_body(&tokens).ok_or("expected a function body")?;

    let params = match &tokens[params_pos] {
        TokenTree::Group(g) => utils::parse_params(g.stream())?,
        _ => unreachable!(),
    };

    let body = match &tokens[body_pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let output = utils::return_type(&tokens[params_pos + 1..body_pos]);
    let new_body = expand_body(&options, &params, output.as_deref(), &body);

    tokens[params_pos] = TokenTree::Group(Group::new(Delimiter::Parenthesis, TokenStream::new()));
    tokens[body_pos] = TokenTree::Group(Group::new(
        Delimiter::Brace,
        new_body
            .parse()
            .map_err(|err| format!("baton entry point error: {err}"))?,
    ));

    Ok(tokens.into_iter().collect())
}

fn expand_body(options: &Options, params: &[Param], output: Option<&str>, body: &str) -> String {
    let mut builder = String::from("::baton::CoroutinesBuilder::new()");

    if let Some(name) = &options.name {
        builder.push_str(&format!(".name({name:?})"));
    }

    if let Some(size) = options.stack_size {
        builder.push_str(&format!(".stack_size({size})"));
    }

    builder.push_str(".build()");

    let manager = params.iter().find(|p| p.role == Role::Manager);
    let thread = params.iter().find(|p| p.role == Role::Thread);

    let capture = if manager.is_some() {
        "let __baton_co = __baton_co.clone();"
    } else {
        ""
    };

    let closure_arg = if thread.is_some() { "__baton_me" } else { "_" };

    let output = output.map(|ty| format!("-> {ty}")).unwrap_or_default();

    let mut bindings = String::new();
    if let Some(p) = manager {
        bindings.push_str(&format!("let {}: {} = __baton_co;\n", p.pattern, p.ty));
    }
    if let Some(p) = thread {
        bindings.push_str(&format!("let {}: {} = __baton_me;\n", p.pattern, p.ty));
    }

    format!(
        "{{
            let __baton_co: ::baton::Coroutines<()> = {builder};
            let (__baton_tx, __baton_rx) = ::std::sync::mpsc::channel();

            let __baton_main = __baton_co.create((), {{
                {capture}
                move |{closure_arg}| {{
                    {bindings}
                    let __baton_body = move || {output} {{ {body} }};
                    let _ = __baton_tx.send(__baton_body());
                    0
                }}
            }});

            if let ::core::result::Result::Err(err) = __baton_main.join() {{
                ::core::panic!(\"{{}}\", err);
            }}

            __baton_rx.recv().expect(\"entry point body did not complete\")
        }}"
    )
}
