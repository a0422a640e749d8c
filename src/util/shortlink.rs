use rand::Rng;

const SYMBOLS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz1234567890";
pub const SUFFIX_LEN: usize = 5;
pub const MARKER: &str = "recipes/";

/// Builds a short link for `url`: everything before [`MARKER`], then `s/` and
/// a random suffix. Without the marker the whole url is used as the prefix.
///
/// Nothing checks the result against links already handed out, so two calls
/// can collide.
pub fn generate_short_link(url: &str) -> String {
    let prefix = match url.find(MARKER) {
        Some(pos) => &url[..pos],
        None => url,
    };
    let mut link = String::with_capacity(prefix.len() + 3 + SUFFIX_LEN);
    link.push_str(prefix);
    if !link.ends_with('/') {
        link.push('/');
    }
    link.push_str("s/");
    link.push_str(&random_suffix(SUFFIX_LEN));
    link
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| SYMBOLS[rng.random_range(0..SYMBOLS.len())] as char)
        .collect()
}
