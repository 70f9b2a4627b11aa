// SPDX-License-Identifier: Apache-2.0

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use examprep_api::params::ReceiptFormat;
use examprep_api::ApiError;
use examprep_model::{Receipt, ReceiptData};
use serde_json::json;
use std::fmt::Write as _;

use crate::error::ApiFailure;
use crate::AppState;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn rows(data: &ReceiptData) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Receipt Number", data.receipt_number.clone()),
        ("Date", data.issued_at.clone()),
        ("Student Name", data.student_name.clone()),
        ("Email", data.student_email.clone()),
    ];
    if let Some(phone) = &data.student_phone {
        rows.push(("Phone", phone.clone()));
    }
    rows.extend([
        ("Course", data.course_name.clone()),
        ("Order ID", data.order_id.clone()),
        ("Transaction ID", data.transaction_id.clone()),
        ("Payment Method", data.payment_method.clone()),
        ("Status", data.status.to_ascii_uppercase()),
    ]);
    rows
}

#[must_use]
pub fn render_html(data: &ReceiptData) -> String {
    let mut body = String::new();
    for (label, value) in rows(data) {
        let _ = writeln!(
            body,
            "      <tr><th>{label}</th><td>{}</td></tr>",
            escape_html(&value)
        );
    }
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  \
         <title>Receipt {number}</title>\n  <style>\n    body {{ font-family: sans-serif; max-width: 640px; margin: 2rem auto; }}\n    \
         th {{ text-align: left; padding-right: 1.5rem; }}\n    .total {{ font-size: 1.25rem; font-weight: bold; }}\n  </style>\n\
         </head>\n<body>\n  <h1>Payment Receipt</h1>\n  <table>\n{body}  </table>\n  \
         <p class=\"total\">Amount Paid: {currency} {amount}</p>\n  <p><small>Digest: {digest}</small></p>\n</body>\n</html>\n",
        number = escape_html(&data.receipt_number),
        currency = escape_html(&data.currency),
        amount = escape_html(&data.amount),
        digest = data.digest,
    )
}

#[must_use]
pub fn render_text(data: &ReceiptData) -> String {
    let rule = "=".repeat(48);
    let mut out = format!("{rule}\n{:^48}\n{rule}\n", "PAYMENT RECEIPT");
    for (label, value) in rows(data) {
        let _ = writeln!(out, "{:<16}: {value}", label);
    }
    let _ = writeln!(out, "{}", "-".repeat(48));
    let _ = writeln!(out, "{:<16}: {} {}", "Amount Paid", data.currency, data.amount);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Digest: {}", data.digest);
    out
}

fn with_headers(mut resp: Response, content_type: &'static str, disposition: String) -> Response {
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        resp.headers_mut().insert(CONTENT_DISPOSITION, v);
    }
    resp
}

/// Bumps the stored download counter from its latest value.
async fn record_download(state: &AppState, receipt: &Receipt) -> Result<Receipt, ApiFailure> {
    let receipts = state.repo::<Receipt>();
    let _guard = state.receipt_lock.lock().await;
    let mut latest = receipts
        .get(&receipt.id)
        .await?
        .ok_or_else(|| ApiFailure(ApiError::not_found("Receipt not found")))?;
    latest.mark_downloaded(Utc::now());
    receipts.save(&latest).await?;
    Ok(latest)
}

/// Records the download, then renders `receipt` in the requested format.
/// `links_base` is the route the alternate-format links point back to.
pub async fn download_response(
    state: &AppState,
    receipt: Receipt,
    format: ReceiptFormat,
    links_base: &str,
) -> Result<Response, ApiFailure> {
    let receipt = record_download(state, &receipt).await?;
    let data = receipt.receipt_data();
    let number = &receipt.receipt_number;

    Ok(match format {
        ReceiptFormat::Html => with_headers(
            render_html(&data).into_response(),
            "text/html; charset=utf-8",
            format!("inline; filename=\"receipt-{number}.html\""),
        ),
        ReceiptFormat::Text => with_headers(
            render_text(&data).into_response(),
            "text/plain; charset=utf-8",
            format!("attachment; filename=\"receipt-{number}.txt\""),
        ),
        ReceiptFormat::Json => Json(json!({
            "success": true,
            "receipt": data,
            "student": {
                "name": receipt.student_name,
                "email": receipt.student_email,
                "phone": receipt.student_phone,
            },
            "downloadCount": receipt.download_count,
            "formats": {
                "html": format!("{links_base}?format=html"),
                "text": format!("{links_base}?format=text"),
            }
        }))
        .into_response(),
    })
}
