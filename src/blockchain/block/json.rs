//! # Json
//!
//! JSON interchange form of a block. Digests and transaction payloads are base64 encoded.

use super::{Block, Hash256, Transaction};

use data_encoding::BASE64;

#[derive(Serialize, Deserialize)]
struct BlockJson {
    no: u32,
    prevhash: String,
    version: u32,
    time: f64,
    /// always recomputed from `transactions` when parsing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    txhash: Option<String>,
    transactions: Vec<String>,
    nonce: u32,
}

impl Block {
    /// Serialize block to its JSON interchange form
    pub fn to_json(&self) -> String {
        let json = BlockJson {
            no: self.number(),
            prevhash: self.prevhash().to_base64(),
            version: self.version(),
            time: self.time(),
            txhash: Some(self.txhash().to_base64()),
            transactions: self
                .transactions
                .iter()
                .map(|x| BASE64.encode(x.payload()))
                .collect(),
            nonce: self.nonce(),
        };
        serde_json::to_string(&json).unwrap_or_default()
    }

    /// Parse a block from its JSON interchange form.
    ///
    /// Returns `None` if the JSON is malformed or if any of `no`, `prevhash`, `version`, `time`,
    /// `transactions`, `nonce` is missing or has a bad value
    pub fn from_json(s: &str) -> Option<Self> {
        let json: BlockJson = match serde_json::from_str(s) {
            Ok(json) => json,
            Err(err) => {
                debug!("could not parse block json: {}", err);
                return None;
            }
        };
        let prevhash = Hash256::from_base64(&json.prevhash)?;
        let transactions = json
            .transactions
            .iter()
            .map(|x| {
                BASE64
                    .decode(x.as_bytes())
                    .ok()
                    .and_then(|payload| Transaction::new(payload).ok())
            })
            .collect::<Option<Vec<Transaction>>>()?;
        let mut block = Self::new(json.no, prevhash, json.time, transactions);
        block.header.set_version(json.version);
        block.set_nonce(json.nonce);
        Some(block)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn should_convert_block_to_json_and_back() {
        let mut block = Block::new(
            2,
            Hash256::digest(b"prev"),
            1660000000000.0,
            vec![
                Transaction::new("note-a").unwrap(),
                Transaction::new("note-b").unwrap(),
            ],
        );
        block.set_nonce(1234);
        let json = block.to_json();
        let parsed = Block::from_json(&json).unwrap();
        assert_eq!(parsed, block);
        assert_eq!(parsed.hash(), block.hash());
    }

    #[test]
    fn should_parse_json_without_txhash() {
        let prevhash = Hash256::digest(b"prev");
        let json = format!(
            r#"{{"no": 1, "prevhash": "{}", "version": 1, "time": 10.0, "transactions": ["Zm9v"], "nonce": 3}}"#,
            prevhash.to_base64()
        );
        let block = Block::from_json(&json).unwrap();
        assert_eq!(block.number(), 1);
        assert_eq!(block.prevhash(), prevhash);
        assert_eq!(block.version(), 1);
        assert_eq!(block.time(), 10.0);
        assert_eq!(block.nonce(), 3);
        assert_eq!(block.transactions()[0].payload(), b"foo");
    }

    #[test]
    fn should_return_none_on_missing_field() {
        let json = format!(
            r#"{{"no": 1, "prevhash": "{}", "version": 1, "time": 10.0, "transactions": []}}"#,
            Hash256::ZERO.to_base64()
        );
        assert!(Block::from_json(&json).is_none());
    }

    #[test]
    fn should_return_none_on_bad_json() {
        assert!(Block::from_json("{ not json").is_none());
        assert!(Block::from_json(
            r#"{"no": 1, "prevhash": "AAAA", "version": 1, "time": 10.0, "transactions": [], "nonce": 0}"#
        )
        .is_none());
    }
}
