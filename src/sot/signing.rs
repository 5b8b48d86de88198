//! SoT request signing (spec.md §6): MD5 of the sorted `key=value` query
//! params joined with `&`, with the app secret appended, lower-hex encoded.
//! Grounded in `syncdata.go`'s `GetSign`/`InitSign`.

pub fn sign(app_key: &str, bs_id: &str, app_secret: &str) -> String {
    let mut params: Vec<(&str, &str)> = vec![("appKey", app_key), ("bsId", bs_id)];
    params.sort_by_key(|(k, _)| *k);

    let joined = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let target = format!("{}{}", joined, app_secret);
    format!("{:x}", md5::compute(target.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_params_alphabetically_before_hashing() {
        // appKey sorts before bsId regardless of insertion order.
        let sig = sign("key123", "key123", "secret");
        let expected_input = "appKey=key123&bsId=key123secret";
        let expected = format!("{:x}", md5::compute(expected_input.as_bytes()));
        assert_eq!(sig, expected);
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(sign("a", "b", "c"), sign("a", "b", "c"));
    }
}
