pub mod frappe;
