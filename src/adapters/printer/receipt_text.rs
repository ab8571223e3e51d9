//! Plain-text receipt rendering.
//!
//! Layout is deliberately minimal: a title block, a rule, and one field per
//! line. Photos are referenced by URL only.

use crate::domain::attendance::{ApprovalReceipt, DenialReceipt};
use crate::domain::foundation::Timestamp;

/// Title printed on denial receipts.
pub const DENIAL_HEADER: &str = "ACCESS DENIED";

const RULE_WIDTH: usize = 32;

/// Title lines and width of printed receipts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    pub header: String,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            header: "CRAWFORD INTERNATIONAL\nCAFETERIA".to_string(),
        }
    }
}

impl ReceiptLayout {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    pub fn approval(&self, receipt: &ApprovalReceipt, printed_at: Timestamp) -> String {
        let mut out = String::new();
        self.title(&mut out, &self.header);
        out.push_str(&format!("Name: {}\n", receipt.name));
        out.push_str(&format!("ID: {}\n", receipt.subject_id));
        out.push_str(&format!("{}\n", receipt.details));
        if let Some(photo) = &receipt.photo_ref {
            out.push_str(&format!("Photo: {}\n", photo));
        }
        out.push_str(&format!("Time: {}\n", printed_at));
        self.rule(&mut out);
        out.push('\n');
        out
    }

    pub fn denial(&self, receipt: &DenialReceipt, printed_at: Timestamp) -> String {
        let mut out = String::new();
        self.title(&mut out, DENIAL_HEADER);
        out.push_str(&format!("{}\n", receipt.message));
        if let Some(photo) = &receipt.photo_ref {
            out.push_str(&format!("Photo: {}\n", photo));
        }
        out.push_str(&format!("Time: {}\n", printed_at));
        self.rule(&mut out);
        out.push('\n');
        out
    }

    fn title(&self, out: &mut String, title: &str) {
        self.rule(out);
        for line in title.lines() {
            out.push_str(line.trim());
            out.push('\n');
        }
        self.rule(out);
    }

    fn rule(&self, out: &mut String) {
        out.push_str(&"=".repeat(RULE_WIDTH));
        out.push('\n');
    }
}
