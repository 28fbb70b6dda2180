//! Event kinds an inbox row can carry, with their stored string forms.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    QueryReceived,      // New investor query in the admin queue
    QueryForwarded,     // Admin approved a question for your product
    ResponseReceived,   // Founder response in the admin queue
    ResponseDelivered,  // Admin approved a response to your question
    QueryRejected,      // Admin rejected a pending query
    DocumentsSubmitted, // Founder documents in the admin queue
    DocumentsApproved,  // Your verification was approved
    DocumentsRejected,  // Your verification was rejected
    ProductSubmitted,   // Product listing in the admin queue
    ProductApproved,    // Your listing went live
    ProductRejected,    // Your listing was rejected
    CallRequested,      // New call request in the admin queue
    CallUpdated,        // Your call request advanced
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::QueryReceived => "query_received",
            Self::QueryForwarded => "query_forwarded",
            Self::ResponseReceived => "response_received",
            Self::ResponseDelivered => "response_delivered",
            Self::QueryRejected => "query_rejected",
            Self::DocumentsSubmitted => "documents_submitted",
            Self::DocumentsApproved => "documents_approved",
            Self::DocumentsRejected => "documents_rejected",
            Self::ProductSubmitted => "product_submitted",
            Self::ProductApproved => "product_approved",
            Self::ProductRejected => "product_rejected",
            Self::CallRequested => "call_requested",
            Self::CallUpdated => "call_updated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "query_received" => Some(Self::QueryReceived),
            "query_forwarded" => Some(Self::QueryForwarded),
            "response_received" => Some(Self::ResponseReceived),
            "response_delivered" => Some(Self::ResponseDelivered),
            "query_rejected" => Some(Self::QueryRejected),
            "documents_submitted" => Some(Self::DocumentsSubmitted),
            "documents_approved" => Some(Self::DocumentsApproved),
            "documents_rejected" => Some(Self::DocumentsRejected),
            "product_submitted" => Some(Self::ProductSubmitted),
            "product_approved" => Some(Self::ProductApproved),
            "product_rejected" => Some(Self::ProductRejected),
            "call_requested" => Some(Self::CallRequested),
            "call_updated" => Some(Self::CallUpdated),
            _ => None,
        }
    }
}
