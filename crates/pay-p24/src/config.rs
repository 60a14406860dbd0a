//! # Przelewy24 Configuration
//!
//! Plugin options arrive loosely typed (a JSON object, a TOML table, or
//! environment variables). Every option is type-checked before a client is built,
//! and a wrong type names the offending option.

use pay_core::{PaymentError, PaymentResult};
use serde_json::{Map, Value};
use std::env;
use std::path::Path;

const PRODUCTION_URL: &str = "https://secure.przelewy24.pl";
const SANDBOX_URL: &str = "https://sandbox.przelewy24.pl";

/// Template used when `descriptionTemplate` is not set
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Payment <id>";

const SANDBOX_PROBLEM: &str = "should be either a boolean or undefined";

/// Validated Przelewy24 plugin options
#[derive(Clone)]
pub struct P24Options {
    pub merchant_id: u64,
    pub pos_id: u64,

    /// REST API key (basic auth password)
    pub api_key: String,

    /// CRC key mixed into every signature
    pub crc_key: String,

    pub use_sandbox: bool,

    /// Where the customer returns after paying (`urlReturn`)
    pub callback_url: String,

    /// Where the gateway posts notifications (`urlStatus`)
    pub notification_url: String,

    /// Transaction description, `<id>`, `<email>`, `<currency>` and `<resourceId>` are substituted
    pub description_template: String,

    api_base_url: Option<String>,
}

impl P24Options {
    /// Validate options given as a JSON object.
    pub fn from_value(options: &Value) -> PaymentResult<Self> {
        let obj = options.as_object().ok_or_else(|| {
            PaymentError::Configuration("plugin options must be an object".to_string())
        })?;

        let use_sandbox = match obj.get("useSandbox") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                return Err(PaymentError::InvalidOption {
                    option: "useSandbox",
                    problem: SANDBOX_PROBLEM,
                })
            }
        };

        let description_template = match obj.get("descriptionTemplate") {
            None | Some(Value::Null) => DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => {
                return Err(PaymentError::InvalidOption {
                    option: "descriptionTemplate",
                    problem: "is not a string",
                })
            }
        };

        Ok(Self {
            merchant_id: require_number(obj, "merchantId")?,
            pos_id: require_number(obj, "posId")?,
            api_key: require_string(obj, "apiKey")?,
            crc_key: require_string(obj, "crcKey")?,
            use_sandbox,
            callback_url: require_string(obj, "callbackUrl")?,
            notification_url: require_string(obj, "notificationUrl")?,
            description_template,
            api_base_url: None,
        })
    }

    /// Load options from a TOML file (top-level keys are the option names).
    pub fn from_toml_file(path: impl AsRef<Path>) -> PaymentResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PaymentError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        let table: toml::Value = toml::from_str(&content).map_err(|e| {
            PaymentError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })?;

        let value = serde_json::to_value(table)
            .map_err(|e| PaymentError::Serialization(e.to_string()))?;

        Self::from_value(&value)
    }

    /// Load options from environment variables.
    ///
    /// Required env vars:
    /// - `P24_MERCHANT_ID`, `P24_POS_ID`
    /// - `P24_API_KEY`, `P24_CRC_KEY`
    /// - `P24_CALLBACK_URL`, `P24_NOTIFICATION_URL`
    ///
    /// Optional: `P24_USE_SANDBOX` (`true`/`false`, `1`/`0`, `yes`/`no`, any case),
    /// `P24_DESCRIPTION_TEMPLATE`
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> PaymentResult<Self> {
        let require = |name: &str| {
            var(name).ok_or_else(|| PaymentError::Configuration(format!("{} not set", name)))
        };

        let mut obj = Map::new();

        obj.insert(
            "merchantId".into(),
            parse_number(&require("P24_MERCHANT_ID")?, "merchantId")?,
        );
        obj.insert(
            "posId".into(),
            parse_number(&require("P24_POS_ID")?, "posId")?,
        );
        obj.insert("apiKey".into(), Value::String(require("P24_API_KEY")?));
        obj.insert("crcKey".into(), Value::String(require("P24_CRC_KEY")?));
        obj.insert(
            "callbackUrl".into(),
            Value::String(require("P24_CALLBACK_URL")?),
        );
        obj.insert(
            "notificationUrl".into(),
            Value::String(require("P24_NOTIFICATION_URL")?),
        );

        if let Some(raw) = var("P24_USE_SANDBOX") {
            obj.insert("useSandbox".into(), Value::Bool(parse_flag(&raw)?));
        }

        if let Some(template) = var("P24_DESCRIPTION_TEMPLATE") {
            obj.insert("descriptionTemplate".into(), Value::String(template));
        }

        Self::from_value(&Value::Object(obj))
    }

    /// Gateway base URL for the selected environment
    pub fn api_base_url(&self) -> &str {
        match &self.api_base_url {
            Some(url) => url,
            None if self.use_sandbox => SANDBOX_URL,
            None => PRODUCTION_URL,
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }
}

impl std::fmt::Debug for P24Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P24Options")
            .field("merchant_id", &self.merchant_id)
            .field("pos_id", &self.pos_id)
            .field("api_key", &"<redacted>")
            .field("crc_key", &"<redacted>")
            .field("use_sandbox", &self.use_sandbox)
            .field("callback_url", &self.callback_url)
            .field("notification_url", &self.notification_url)
            .field("description_template", &self.description_template)
            .finish()
    }
}

fn require_number(obj: &Map<String, Value>, option: &'static str) -> PaymentResult<u64> {
    obj.get(option)
        .and_then(Value::as_u64)
        .ok_or(PaymentError::InvalidOption {
            option,
            problem: "is not a number",
        })
}

fn require_string(obj: &Map<String, Value>, option: &'static str) -> PaymentResult<String> {
    obj.get(option)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(PaymentError::InvalidOption {
            option,
            problem: "is not a string",
        })
}

fn parse_number(raw: &str, option: &'static str) -> PaymentResult<Value> {
    raw.trim()
        .parse::<u64>()
        .map(Value::from)
        .map_err(|_| PaymentError::InvalidOption {
            option,
            problem: "is not a number",
        })
}

fn parse_flag(raw: &str) -> PaymentResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PaymentError::InvalidOption {
            option: "useSandbox",
            problem: SANDBOX_PROBLEM,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn valid_options() -> Value {
        json!({
            "merchantId": 123456,
            "posId": 123456,
            "apiKey": "api-key",
            "crcKey": "crc-key",
            "callbackUrl": "https://shop.example.pl/checkout/return",
            "notificationUrl": "https://shop.example.pl/store/przelewy24/notify"
        })
    }

    fn expect_invalid(options: Value, option: &str) {
        match P24Options::from_value(&options) {
            Err(PaymentError::InvalidOption { option: got, .. }) => assert_eq!(got, option),
            other => panic!("expected InvalidOption for {}, got {:?}", option, other),
        }
    }

    #[test]
    fn test_valid_options_with_defaults() {
        let options = P24Options::from_value(&valid_options()).unwrap();

        assert_eq!(options.merchant_id, 123456);
        assert!(!options.use_sandbox);
        assert_eq!(options.description_template, DEFAULT_DESCRIPTION_TEMPLATE);
        assert_eq!(options.api_base_url(), PRODUCTION_URL);
    }

    #[test]
    fn test_sandbox_url() {
        let mut raw = valid_options();
        raw["useSandbox"] = json!(true);
        let options = P24Options::from_value(&raw).unwrap();

        assert_eq!(options.api_base_url(), SANDBOX_URL);
        assert_eq!(
            options.with_api_base_url("http://127.0.0.1:9999").api_base_url(),
            "http://127.0.0.1:9999"
        );
    }

    #[test]
    fn test_rejects_malformed_option_types() {
        let cases = [
            ("merchantId", json!("123456")),
            ("posId", json!(null)),
            ("apiKey", json!(42)),
            ("crcKey", json!(["crc"])),
            ("useSandbox", json!("yes")),
            ("callbackUrl", json!(false)),
            ("notificationUrl", json!({})),
            ("descriptionTemplate", json!(7)),
        ];

        for (option, bad) in cases {
            let mut raw = valid_options();
            raw[option] = bad;
            expect_invalid(raw, option);
        }
    }

    #[test]
    fn test_missing_required_option() {
        let mut raw = valid_options();
        raw.as_object_mut().unwrap().remove("crcKey");
        expect_invalid(raw, "crcKey");
    }

    #[test]
    fn test_non_object_options() {
        assert!(matches!(
            P24Options::from_value(&json!("options")),
            Err(PaymentError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let options = P24Options::from_value(&valid_options()).unwrap();
        let printed = format!("{:?}", options);

        assert!(!printed.contains("api-key"));
        assert!(!printed.contains("crc-key"));
    }

    #[test]
    fn test_from_toml_file() {
        let path = std::env::temp_dir().join(format!("p24-options-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
merchantId = 1000
posId = 1001
apiKey = "k"
crcKey = "c"
useSandbox = true
callbackUrl = "https://shop.example.pl/return"
notificationUrl = "https://shop.example.pl/notify"
descriptionTemplate = "Order <resourceId>"
"#,
        )
        .unwrap();

        let options = P24Options::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(options.pos_id, 1001);
        assert!(options.use_sandbox);
        assert_eq!(options.description_template, "Order <resourceId>");
    }

    #[test]
    fn test_toml_string_merchant_id_rejected() {
        let path = std::env::temp_dir().join(format!("p24-options-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
merchantId = "1000"
posId = 1001
apiKey = "k"
crcKey = "c"
callbackUrl = "https://shop.example.pl/return"
notificationUrl = "https://shop.example.pl/notify"
"#,
        )
        .unwrap();

        let result = P24Options::from_toml_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(PaymentError::InvalidOption {
                option: "merchantId",
                ..
            })
        ));
    }

    fn env_vars(overrides: &[(&str, &str)]) -> HashMap<String, String> {
        let mut vars: HashMap<String, String> = [
            ("P24_MERCHANT_ID", "1000"),
            ("P24_POS_ID", "1001"),
            ("P24_API_KEY", "api-key"),
            ("P24_CRC_KEY", "crc-key"),
            ("P24_CALLBACK_URL", "https://shop.example.pl/return"),
            ("P24_NOTIFICATION_URL", "https://shop.example.pl/notify"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }
        vars
    }

    fn from_vars(vars: &HashMap<String, String>) -> PaymentResult<P24Options> {
        P24Options::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_from_vars() {
        let options = from_vars(&env_vars(&[
            ("P24_USE_SANDBOX", "TRUE"),
            ("P24_DESCRIPTION_TEMPLATE", "Order <resourceId>"),
        ]))
        .unwrap();

        assert_eq!(options.merchant_id, 1000);
        assert_eq!(options.pos_id, 1001);
        assert_eq!(options.notification_url, "https://shop.example.pl/notify");
        assert!(options.use_sandbox);
        assert_eq!(options.description_template, "Order <resourceId>");
    }

    #[test]
    fn test_from_vars_sandbox_spellings() {
        for (raw, flag) in [("1", true), ("yes", true), ("false", false), ("0", false), ("No", false)] {
            let options = from_vars(&env_vars(&[("P24_USE_SANDBOX", raw)])).unwrap();
            assert_eq!(options.use_sandbox, flag, "P24_USE_SANDBOX={}", raw);
        }
    }

    #[test]
    fn test_from_vars_rejects_bad_values() {
        let err = from_vars(&env_vars(&[("P24_MERCHANT_ID", "abc")])).unwrap_err();
        assert_eq!(err.to_string(), "merchantId is not a number");

        let err = from_vars(&env_vars(&[("P24_USE_SANDBOX", "maybe")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "useSandbox should be either a boolean or undefined"
        );

        let mut vars = env_vars(&[]);
        vars.remove("P24_CRC_KEY");
        assert!(matches!(
            from_vars(&vars),
            Err(PaymentError::Configuration(msg)) if msg == "P24_CRC_KEY not set"
        ));
    }

    #[test]
    fn test_from_env() {
        // The only test touching the process environment.
        for (k, v) in env_vars(&[("P24_POS_ID", "2002")]) {
            env::set_var(k, v);
        }
        env::remove_var("P24_USE_SANDBOX");

        let options = P24Options::from_env().unwrap();

        assert_eq!(options.pos_id, 2002);
        assert!(!options.use_sandbox);
    }
}
