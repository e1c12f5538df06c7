//! Cache key namespace: the bare prefix (`tweets`, `users`) keys the
//! collection listing; `{prefix}:{id}` keys a single entity.

pub const TWEETS: &str = "tweets";
pub const USERS: &str = "users";

pub fn item(prefix: &str, id: i64) -> String {
    format!("{}:{}", prefix, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_shape() {
        assert_eq!(item(TWEETS, 7), "tweets:7");
        assert_eq!(item(USERS, 12), "users:12");
    }
}
