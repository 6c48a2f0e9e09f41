use blake2::{digest::consts::U32, Blake2b, Digest};
use log::*;
use serde::Serialize;

type Blake2b256 = Blake2b<U32>;

/// The Blake2b-256 digest, hex encoded, of the JSON form of `document`. Audit rows store this to pin down the exact
/// state a mutation produced.
pub fn state_hash<T: Serialize>(document: &T) -> String {
    let json = serde_json::to_vec(document).unwrap_or_else(|e| {
        error!("🗃️ Could not serialize a document for its audit hash. {e}");
        Vec::new()
    });
    hex::encode(Blake2b256::digest(json))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn hash_tracks_content() {
        let a = state_hash(&json!({"status": "pending", "id": 1}));
        let b = state_hash(&json!({"status": "accepted", "id": 1}));
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_eq!(a, state_hash(&json!({"status": "pending", "id": 1})));
    }
}
