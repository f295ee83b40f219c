use crate::records::{Customer, Invoice, Subscription, SupportTicket};

/// Search/status predicates applied to an in-memory collection. Both
/// predicates are ANDed; an empty predicate matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterQuery {
    pub search_text: String,
    pub status_text: String,
}

impl FilterQuery {
    pub fn new(search_text: impl Into<String>, status_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            status_text: status_text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty() && self.status_text.trim().is_empty()
    }
}

/// Implemented by records that can appear in a filterable list view.
pub trait Filterable {
    /// Fields probed by the case-insensitive substring search.
    fn search_fields(&self) -> Vec<&str>;
    /// Field compared against the status predicate by case-insensitive
    /// equality.
    fn status_field(&self) -> &str;

    fn matches(&self, query: &FilterQuery) -> bool {
        let search = query.search_text.trim().to_lowercase();
        let matches_search = search.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&search));

        let status = query.status_text.trim();
        let matches_status =
            status.is_empty() || self.status_field().eq_ignore_ascii_case(status);

        matches_search && matches_status
    }
}

/// Pure filter over a snapshot. Preserves input order and is idempotent:
/// `filter_records(&filter_records(c, q), q) == filter_records(c, q)`.
pub fn filter_records<T: Filterable + Clone>(records: &[T], query: &FilterQuery) -> Vec<T> {
    records
        .iter()
        .filter(|record| record.matches(query))
        .cloned()
        .collect()
}

impl Filterable for Invoice {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.customer]
    }

    fn status_field(&self) -> &str {
        &self.status
    }
}

impl Filterable for SupportTicket {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.customer, &self.subject, &self.description]
    }

    fn status_field(&self) -> &str {
        &self.status
    }
}

impl Filterable for Subscription {
    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.party]
    }

    fn status_field(&self) -> &str {
        &self.status
    }
}

impl Filterable for Customer {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.customer_name.as_str(), self.custom_email.as_str()];
        if let Some(partner) = self.custom_partner.as_deref() {
            fields.push(partner);
        }
        fields
    }

    // The admin directory groups customers by billing type rather than a
    // lifecycle status.
    fn status_field(&self) -> &str {
        self.custom_billing_type.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_records, FilterQuery};
    use crate::records::Invoice;

    fn invoice(name: &str, customer: &str, status: &str) -> Invoice {
        Invoice {
            name: name.to_owned(),
            customer: customer.to_owned(),
            posting_date: "2024-01-01".to_owned(),
            grand_total: 10.0,
            currency: "USD".to_owned(),
            status: status.to_owned(),
        }
    }

    #[test]
    fn empty_query_returns_full_collection_in_order() {
        let invoices = vec![
            invoice("INV-2", "B", "Unpaid"),
            invoice("INV-1", "A", "Paid"),
        ];
        let filtered = filter_records(&invoices, &FilterQuery::default());
        assert_eq!(filtered, invoices);
    }

    #[test]
    fn search_is_case_insensitive_substring_match() {
        let invoices = vec![
            invoice("INV-1", "Acme Networks", "Paid"),
            invoice("INV-2", "Bolt ISP", "Paid"),
        ];
        let filtered = filter_records(&invoices, &FilterQuery::new("acme", ""));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "INV-1");
    }

    #[test]
    fn status_is_case_insensitive_equality_not_substring() {
        let invoices = vec![
            invoice("INV-1", "A", "Paid"),
            invoice("INV-2", "B", "Unpaid"),
        ];
        let filtered = filter_records(&invoices, &FilterQuery::new("", "paid"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "INV-1");
    }

    #[test]
    fn search_and_status_predicates_are_anded() {
        let invoices = vec![
            invoice("INV-1", "Acme", "Paid"),
            invoice("INV-2", "Acme", "Unpaid"),
            invoice("INV-3", "Bolt", "Paid"),
        ];
        let filtered = filter_records(&invoices, &FilterQuery::new("acme", "Paid"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "INV-1");
    }

    #[test]
    fn unmatched_status_yields_empty_subset() {
        let invoices = vec![invoice("INV-1", "A", "Paid")];
        let filtered = filter_records(&invoices, &FilterQuery::new("", "Unpaid"));
        assert!(filtered.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let invoices = vec![
            invoice("INV-1", "Acme", "Paid"),
            invoice("INV-2", "Bolt", "Unpaid"),
            invoice("INV-3", "Acme", "Overdue"),
        ];
        let query = FilterQuery::new("acme", "");
        let once = filter_records(&invoices, &query);
        let twice = filter_records(&once, &query);
        assert_eq!(once, twice);
    }
}
