use serde::{Deserialize, Serialize};

/// Response from the NSE option-chain-indices endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChain {
    pub records: Records,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub timestamp: String,

    #[serde(rename = "underlyingValue")]
    pub underlying_value: PriceField,

    #[serde(default)]
    pub data: Vec<OptionData>,
}

/// One strike row as NSE sends it (all expiries mixed together)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionData {
    #[serde(rename = "strikePrice")]
    pub strike_price: f64,

    #[serde(rename = "expiryDate", default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,

    #[serde(rename = "CE")]
    pub call: Option<OiLeg>,

    #[serde(rename = "PE")]
    pub put: Option<OiLeg>,
}

/// Call or put side of a strike. Only open interest is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OiLeg {
    #[serde(rename = "openInterest", default)]
    pub open_interest: f64,
}

impl OiLeg {
    pub fn new(open_interest: f64) -> Self {
        Self { open_interest }
    }
}

/// A price that may arrive as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    /// Positive finite price, or None.
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            PriceField::Number(n) => *n,
            PriceField::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

impl From<f64> for PriceField {
    fn from(value: f64) -> Self {
        PriceField::Number(value)
    }
}

/// Transport-agnostic strike record consumed by the chain builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStrikeRecord {
    pub strike_price: f64,
    pub underlying_value: PriceField,
    pub call: Option<OiLeg>,
    pub put: Option<OiLeg>,
}

impl RawStrikeRecord {
    pub fn new(
        strike_price: f64,
        underlying: impl Into<PriceField>,
        call_oi: f64,
        put_oi: f64,
    ) -> Self {
        Self {
            strike_price,
            underlying_value: underlying.into(),
            call: Some(OiLeg::new(call_oi)),
            put: Some(OiLeg::new(put_oi)),
        }
    }
}

impl OptionChain {
    /// Flatten the payload into builder input, stamping every row with the
    /// snapshot-level underlying value.
    pub fn raw_records(&self) -> Vec<RawStrikeRecord> {
        self.records
            .data
            .iter()
            .map(|opt| RawStrikeRecord {
                strike_price: opt.strike_price,
                underlying_value: self.records.underlying_value.clone(),
                call: opt.call,
                put: opt.put,
            })
            .collect()
    }
}

/// One strike of the option chain after normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    pub call_open_interest: u64,
    pub put_open_interest: u64,
    pub underlying_price: f64,
}

impl ChainRow {
    pub fn new(
        strike: f64,
        call_open_interest: u64,
        put_open_interest: u64,
        underlying_price: f64,
    ) -> Self {
        Self { strike, call_open_interest, put_open_interest, underlying_price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nse_payload() {
        let json = r#"{
            "records": {
                "timestamp": "16-Oct-2026 10:15:00",
                "underlyingValue": 24987.35,
                "data": [
                    {"strikePrice": 24950, "expiryDate": "30-Oct-2026",
                     "CE": {"openInterest": 300, "lastPrice": 80.5},
                     "PE": {"openInterest": 800}},
                    {"strikePrice": 25000, "CE": {"openInterest": 900}}
                ]
            }
        }"#;

        let chain: OptionChain = serde_json::from_str(json).unwrap();
        assert_eq!(chain.records.underlying_value.parse(), Some(24987.35));

        let raw = chain.raw_records();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].put, Some(OiLeg::new(800.0)));
        assert_eq!(raw[1].put, None);
        assert_eq!(raw[1].underlying_value, PriceField::Number(24987.35));
    }

    #[test]
    fn test_price_field_parse() {
        assert_eq!(PriceField::Text(" 24,987.5 ".to_string()).parse(), Some(24987.5));
        assert_eq!(PriceField::Text("n/a".to_string()).parse(), None);
        assert_eq!(PriceField::Number(0.0).parse(), None);
        assert_eq!(PriceField::Number(-5.0).parse(), None);
        assert_eq!(PriceField::Number(f64::NAN).parse(), None);
    }
}
