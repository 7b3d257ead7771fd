#![allow(dead_code)]

use wiremock::ResponseTemplate;

pub const INVOICE_ID: &str = "Xq3vT9pLm2KcR8wYz1Ab";

/// Poll response shaped like the server's invoice record.
pub fn invoice_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": INVOICE_ID,
        "chain": "BSC",
        "token": "USDT",
        "amount_native": "25.00",
        "deposit_address": "0x8a3f5c1e9b2d4a6f7e0c1b2a3d4e5f6a7b8c9d0e",
        "status": status,
    })
}

pub fn invoice_response(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(invoice_json(status))
}

/// An event-stream body carrying one `status` event per entry.
pub fn status_stream(statuses: &[&str]) -> String {
    let mut body = String::from(": connected\n\n");
    for status in statuses {
        body.push_str("event: status\n");
        body.push_str(&format!("data: {{\"status\":\"{status}\"}}\n\n"));
    }
    body
}

pub fn stream_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}
