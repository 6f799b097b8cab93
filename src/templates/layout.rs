use serde_json::Value;
use std::fmt::Write;

/// Escape text for use in HTML element content and quoted attributes
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// =============================================================================
// Context access
// =============================================================================

/// String at JSON `pointer`, or "" when absent
pub(crate) fn text<'a>(context: &'a Value, pointer: &str) -> &'a str {
    context.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

/// Escaped string at JSON `pointer`
pub(crate) fn escaped(context: &Value, pointer: &str) -> String {
    escape_html(text(context, pointer))
}

pub(crate) fn flag(context: &Value, pointer: &str) -> bool {
    context
        .pointer(pointer)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub(crate) fn number(context: &Value, pointer: &str) -> u64 {
    context
        .pointer(pointer)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

pub(crate) fn items<'a>(context: &'a Value, pointer: &str) -> &'a [Value] {
    context
        .pointer(pointer)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
}

/// Present and not null
pub(crate) fn present(context: &Value, pointer: &str) -> bool {
    context.pointer(pointer).is_some_and(|value| !value.is_null())
}

/// `id_str` when the API sent one, otherwise the numeric id
pub(crate) fn twitter_id(object: &Value) -> String {
    match text(object, "/id_str") {
        "" => number(object, "/id").to_string(),
        id => id.to_string(),
    }
}

// =============================================================================
// Layout
// =============================================================================

pub(crate) fn page(title: &str, context: &Value, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{styles}</style>
</head>
<body>
    <nav>
        <a href="/" class="brand">Twitter Winner</a>
        {nav}
    </nav>
    <main>
        {flashes}
        {body}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        styles = styles(),
        nav = nav(context),
        flashes = flashes(context),
    )
}

fn nav(context: &Value) -> String {
    let mut links = String::new();
    if flag(context, "/logged_in") {
        links.push_str(
            r#"<a href="/profile">Profile</a>
        <a href="/followers">Followers</a>
        <a href="/retweets">Retweets</a>
        <a href="/searches">Searches</a>
        "#,
        );
    }

    // Sign-in links stay visible once signed in so another provider can be linked
    for provider in items(context, "/providers") {
        let _ = write!(
            links,
            r#"<a href="/auth/{name}" class="provider provider-{name}">Sign in with {label}</a>
        "#,
            name = escaped(provider, "/name"),
            label = escaped(provider, "/label"),
        );
    }

    if flag(context, "/logged_in") {
        links.push_str(r#"<a href="/logout" class="logout">Logout</a>"#);
    }
    links
}

fn flashes(context: &Value) -> String {
    let flashes = items(context, "/flashes");
    if flashes.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<ul class="flashes">"#);
    for flash in flashes {
        let _ = write!(
            html,
            r#"<li class="flash flash-{level}">{message}</li>"#,
            level = escaped(flash, "/level"),
            message = escaped(flash, "/message"),
        );
    }
    html.push_str("</ul>");
    html
}

/// Render a list of Twitter users as avatar cards
pub(crate) fn user_cards(users: &[Value]) -> String {
    let mut html = String::from(r#"<ul class="users">"#);
    for user in users {
        html.push_str(&user_card(user, "li"));
    }
    html.push_str("</ul>");
    html
}

pub(crate) fn user_card(user: &Value, tag: &str) -> String {
    let avatar = match text(user, "/profile_image_url_https") {
        "" => text(user, "/profile_image_url"),
        url => url,
    };
    let screen_name = escaped(user, "/screen_name");
    format!(
        r#"<{tag} class="user"><img src="{avatar}" alt="" width="48" height="48"> <a href="https://twitter.com/{screen_name}">@{screen_name}</a> {name}</{tag}>"#,
        avatar = escape_html(avatar),
        name = escaped(user, "/name"),
    )
}

pub(crate) fn incomplete_notice(context: &Value) -> &'static str {
    if flag(context, "/incomplete_list") {
        r#"<p class="warning">Twitter stopped answering before the whole list was fetched (rate limit?). The draw only covers the part shown here.</p>"#
    } else {
        ""
    }
}

const fn styles() -> &'static str {
    r"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
            margin: 0;
            background: #f5f8fa;
            color: #14171a;
        }
        nav {
            display: flex;
            flex-wrap: wrap;
            gap: 12px;
            padding: 12px 20px;
            background: #1da1f2;
        }
        nav a {
            color: white;
            text-decoration: none;
        }
        nav .brand {
            font-weight: 700;
            margin-right: auto;
        }
        main {
            max-width: 720px;
            margin: 20px auto;
            padding: 0 20px;
        }
        .flashes {
            list-style: none;
            padding: 0;
        }
        .flash {
            padding: 10px;
            border-radius: 6px;
            margin-bottom: 8px;
            background: #e8f5fd;
        }
        .flash-error {
            background: #fde8e8;
        }
        .flash-success {
            background: #e8fde9;
        }
        .users {
            list-style: none;
            padding: 0;
        }
        .user img {
            vertical-align: middle;
            border-radius: 50%;
        }
        .winner {
            padding: 16px;
            border: 2px solid #1da1f2;
            border-radius: 10px;
            background: white;
        }
        .warning {
            color: #b35c00;
        }
    "
}
