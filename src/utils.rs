//! Player address helpers. Player URLs are handled as plain strings because
//! embed addresses are often protocol-relative (`//player.example.com/...`).

/// Query parameter carrying the player's start offset in seconds.
pub const TIME_OFFSET_PARAM: &str = "t";

/// Parameters that switch the embedded player's message API on.
pub const PLAYER_API_PARAMS: &[(&str, &str)] = &[("api", "1"), ("player_type", "1"), ("enableapi", "1")];

fn split_url(url: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    match rest.split_once('?') {
        Some((base, query)) => (base, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

fn join_url(base: &str, pairs: &[String], fragment: Option<&str>) -> String {
    let mut url = base.to_string();
    if !pairs.is_empty() {
        url.push('?');
        url.push_str(&pairs.join("&"));
    }
    if let Some(fragment) = fragment {
        url.push('#');
        url.push_str(fragment);
    }
    url
}

fn pair_key(pair: &str) -> &str {
    pair.split_once('=').map(|(key, _)| key).unwrap_or(pair)
}

/// First value of query parameter `name`, percent-decoded.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query, _) = split_url(url);
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Drop every time-offset parameter from `url` and append `t=<seconds>`.
pub fn seek_url(url: &str, seconds: u32) -> String {
    let (base, query, fragment) = split_url(url);
    let mut pairs: Vec<String> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && pair_key(pair) != TIME_OFFSET_PARAM)
        .map(str::to_string)
        .collect();
    pairs.push(format!("{}={}", TIME_OFFSET_PARAM, seconds));
    join_url(base, &pairs, fragment)
}

/// Append any missing [`PLAYER_API_PARAMS`]; existing ones are left alone.
pub fn with_player_api_params(url: &str) -> String {
    let (base, query, fragment) = split_url(url);
    let mut pairs: Vec<String> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(str::to_string)
        .collect();
    for (key, value) in PLAYER_API_PARAMS {
        if !pairs.iter().any(|pair| pair_key(pair) == *key) {
            pairs.push(format!("{}={}", key, value));
        }
    }
    join_url(base, &pairs, fragment)
}

/// Address of the duration proxy endpoint for `bvid`.
pub fn proxy_endpoint(proxy_base: &str, bvid: &str) -> String {
    format!(
        "{}/api/bilibili-proxy?bvid={}",
        proxy_base.trim_end_matches('/'),
        urlencoding::encode(bvid)
    )
}
