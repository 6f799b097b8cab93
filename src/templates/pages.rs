//! Bodies of the built-in pages; the layout wraps them

use crate::templates::layout::{
    escape_html, escaped, incomplete_notice, items, number, present, text, twitter_id, user_card,
    user_cards,
};
use serde_json::Value;
use std::fmt::Write;

pub fn home(context: &Value) -> String {
    if !present(context, "/user") {
        return r#"<h1>Pick a winner</h1>
        <p>Sign in with Twitter, then draw a random winner among your followers, the people who retweeted one of your tweets, or the authors of tweets matching one of your saved searches.</p>"#
            .to_string();
    }

    format!(
        r#"<h1>Welcome, {name}</h1>
        <p>Who wins today?</p>
        <ul>
            <li><a href="/followers">A random follower</a></li>
            <li><a href="/retweets">A random retweeter</a></li>
            <li><a href="/searches">A random author from a saved search</a></li>
        </ul>"#,
        name = escaped(context, "/user/name"),
    )
}

pub fn profile(context: &Value) -> String {
    if !present(context, "/user") {
        return "<h1>Profile</h1><p>You are not signed in.</p>".to_string();
    }

    let mut identities = String::new();
    for auth_id in items(context, "/user/auth_ids") {
        let _ = write!(
            identities,
            "<li>{}</li>",
            escape_html(auth_id.as_str().unwrap_or_default())
        );
    }

    let link = match text(context, "/user/link") {
        "" => String::new(),
        link if is_web_url(link) => format!(
            r#"<p><a href="{link}">{link}</a></p>"#,
            link = escape_html(link)
        ),
        link => format!("<p>{}</p>", escape_html(link)),
    };
    let email = match text(context, "/user/email") {
        "" => String::new(),
        email => format!("<p>{}</p>", escape_html(email)),
    };
    let social = if context
        .pointer("/user/social_linked")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        "<p>Your Twitter account is linked.</p>".to_string()
    } else {
        format!(
            r#"<p class="warning">Link your Twitter account to draw winners: <a href="/auth/{provider}">sign in with Twitter</a>.</p>"#,
            provider = escaped(context, "/user/social_provider"),
        )
    };

    format!(
        r#"<h1>{name}</h1>
        <img src="{avatar}" alt="" width="96" height="96">
        {link}
        {email}
        {social}
        <h2>Linked accounts</h2>
        <ul>{identities}</ul>
        <p>Signed in with {provider} at {signed_in_at}, session valid until {expires_at}.</p>"#,
        name = escaped(context, "/user/name"),
        avatar = escaped(context, "/user/avatar_url"),
        provider = escaped(context, "/session/provider"),
        signed_in_at = escaped(context, "/session/signed_in_at"),
        expires_at = escaped(context, "/session/expires_at"),
    )
}

pub fn followers(context: &Value) -> String {
    let followers = items(context, "/followers");
    let winner = match context.pointer("/winner") {
        Some(winner) if !winner.is_null() => winner_box(&user_card(winner, "div")),
        _ => "<p>No followers, no winner.</p>".to_string(),
    };

    format!(
        r"<h1>Followers</h1>
        {incomplete}
        {winner}
        <h2>{count} followers</h2>
        {list}",
        incomplete = incomplete_notice(context),
        count = followers.len(),
        list = user_cards(followers),
    )
}

pub fn retweets(context: &Value) -> String {
    if let Some(retweet) = context.pointer("/retweet").filter(|v| !v.is_null()) {
        let winner = match context.pointer("/winner") {
            Some(winner) if !winner.is_null() => winner_box(&user_card(winner, "div")),
            _ => "<p>Nobody retweeted this yet, no winner.</p>".to_string(),
        };
        return format!(
            r#"<h1>Retweets</h1>
            <blockquote>{tweet}</blockquote>
            {incomplete}
            <p>{count} retweeters</p>
            {winner}
            <p><a href="/retweets">Back to your retweeted tweets</a></p>"#,
            tweet = escaped(retweet, "/text"),
            incomplete = incomplete_notice(context),
            count = number(context, "/retweeter_count"),
        );
    }

    let retweets = items(context, "/retweets");
    let mut list = String::new();
    for tweet in retweets {
        let _ = write!(
            list,
            r#"<li><a href="/retweets?id={id}">{text}</a> ({count} retweets)</li>"#,
            id = escape_html(&twitter_id(tweet)),
            text = escaped(tweet, "/text"),
            count = number(tweet, "/retweet_count"),
        );
    }
    if retweets.is_empty() {
        list.push_str("<li>None of your tweets were retweeted.</li>");
    }

    format!(
        r"<h1>Retweets</h1>
        {incomplete}
        <p>Pick a tweet to draw a winner among its retweeters.</p>
        <ul>{list}</ul>",
        incomplete = incomplete_notice(context),
    )
}

pub fn searches(context: &Value) -> String {
    if let Some(search) = context.pointer("/search").filter(|v| !v.is_null()) {
        let winner = match (context.pointer("/winner"), context.pointer("/tweet")) {
            (Some(winner), Some(tweet)) if !winner.is_null() && !tweet.is_null() => {
                winner_box(&format!(
                    "{card}<blockquote>{text}</blockquote>",
                    card = user_card(winner, "div"),
                    text = escaped(tweet, "/text"),
                ))
            }
            _ => "<p>No tweet matches this search, no winner.</p>".to_string(),
        };
        return format!(
            r#"<h1>{name}</h1>
            <p>Query: <code>{query}</code></p>
            {incomplete}
            <p>{count} matching tweets</p>
            {winner}
            <p><a href="/searches">Back to your saved searches</a></p>"#,
            name = escaped(search, "/name"),
            query = escaped(search, "/query"),
            incomplete = incomplete_notice(context),
            count = number(context, "/tweet_count"),
        );
    }

    let searches = items(context, "/searches");
    let mut list = String::new();
    for search in searches {
        let _ = write!(
            list,
            r#"<li><a href="/searches?id={id}">{name}</a> <code>{query}</code></li>"#,
            id = escape_html(&twitter_id(search)),
            name = escaped(search, "/name"),
            query = escaped(search, "/query"),
        );
    }
    if searches.is_empty() {
        list.push_str("<li>You have no saved searches.</li>");
    }

    format!(
        r"<h1>Saved searches</h1>
        {incomplete}
        <ul>{list}</ul>",
        incomplete = incomplete_notice(context),
    )
}

pub fn error(context: &Value) -> String {
    let message = match text(context, "/message") {
        "" => "Something went wrong.",
        message => message,
    };
    format!(
        r#"<h1>Oops</h1>
        <p class="warning">{message}</p>
        <p><a href="/">Back home</a></p>"#,
        message = escape_html(message),
    )
}

fn winner_box(inner: &str) -> String {
    format!(r#"<div class="winner"><h2>And the winner is</h2>{inner}</div>"#)
}

/// Only http(s) URLs may become an `href`
fn is_web_url(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
