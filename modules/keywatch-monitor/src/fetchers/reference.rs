//! Operator-supplied references arrive as ids, short names or full URLs.

const VK_HOSTS: [&str; 3] = ["m.vk.com/", "www.vk.com/", "vk.com/"];
const TELEGRAM_HOSTS: [&str; 3] = ["www.t.me/", "t.me/", "telegram.me/"];

fn strip_scheme(reference: &str) -> &str {
    reference
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
}

fn strip_host<'a>(reference: &'a str, hosts: &[&str]) -> &'a str {
    hosts
        .iter()
        .find_map(|host| reference.strip_prefix(host))
        .unwrap_or(reference)
}

/// `https://vk.com/apiclub/` → `apiclub`.
pub fn normalize_vk_reference(reference: &str) -> String {
    strip_host(strip_scheme(reference), &VK_HOSTS)
        .trim_matches('/')
        .to_string()
}

/// `https://t.me/s/durov`, `@durov` → `durov`.
pub fn normalize_telegram_reference(reference: &str) -> String {
    let rest = strip_host(strip_scheme(reference), &TELEGRAM_HOSTS).trim_matches('/');
    let rest = rest.strip_prefix("s/").unwrap_or(rest);
    rest.trim_start_matches('@').trim_matches('/').to_string()
}
