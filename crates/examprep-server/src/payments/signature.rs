use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 the gateway attaches to a completed checkout.
#[must_use]
pub fn payment_signature(order_id: &str, payment_id: &str, secret: &str) -> Option<String> {
    mac_for(order_id, payment_id, secret).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a checkout signature.
#[must_use]
pub fn verify_signature(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    mac_for(order_id, payment_id, secret).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}
