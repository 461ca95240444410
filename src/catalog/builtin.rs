//! Entities shipped with the SDK

use super::StaticFieldCatalog;
use crate::models::{EntityDescriptor, FieldDescriptor, FieldType};

fn field(id: &str, field_type: FieldType, description: &str) -> FieldDescriptor {
    FieldDescriptor::new(id, id, field_type).with_description(description)
}

pub(super) fn catalog() -> StaticFieldCatalog {
    use FieldType::{Boolean, Date, Datetime, Int, Object, String};

    StaticFieldCatalog::new()
        .with_entity(
            EntityDescriptor::new(
                "time-entry",
                "Time Entry",
                "Records of time spent on tasks and activities",
            ),
            vec![
                field("entry_id", String, "Time entry unique identifier"),
                field("entry_staff_id", String, "Staff member who logged the time"),
                field("entry_date", Date, "Date the work was performed"),
                field("start_time", Datetime, "When the activity started"),
                field("end_time", Datetime, "When the activity ended"),
                field("duration_minutes", Int, "Length of the activity in minutes"),
                field("activity", String, "Activity or task description"),
                field("is_billable", Boolean, "Whether the time can be billed"),
            ],
        )
        .with_entity(
            EntityDescriptor::new("staff", "Staff", "Personnel and employee information"),
            vec![
                field("employee_id", String, "Employee unique identifier"),
                field("first_name", String, "Employee first name"),
                field("last_name", String, "Employee last name"),
                field("position", String, "Employee position"),
                field("email", String, "Employee email address"),
                field("hire_date", Date, "Employee hire date"),
                field("salary", Int, "Employee salary"),
                field("is_active", Boolean, "Employee status"),
            ],
        )
        .with_entity(
            EntityDescriptor::new("individuals", "Individuals", "Client and recipient data"),
            vec![
                field("individual_id", String, "Individual unique identifier"),
                field("given_name", String, "Given name"),
                field("family_name", String, "Family name"),
                field("birth_date", Date, "Date of birth"),
                field("phone", String, "Contact phone number"),
                field("address", Object, "Postal address"),
                field("enrolled", Boolean, "Currently enrolled in a program"),
            ],
        )
        .with_entity(
            EntityDescriptor::new("programs", "Programs", "Service programs and initiatives"),
            vec![
                field("program_id", String, "Program unique identifier"),
                field("program_name", String, "Program name"),
                field("program_status", String, "Program status"),
                field("start_date", Date, "Program start date"),
                field("end_date", Date, "Program end date"),
                field("capacity", Int, "Maximum number of participants"),
                field("funding", Object, "Funding sources"),
            ],
        )
        .with_entity(
            EntityDescriptor::new("billing", "Billing", "Invoice and payment records"),
            vec![
                field("invoice_id", String, "Invoice unique identifier"),
                field("invoice_date", Date, "Date the invoice was issued"),
                field("amount", Int, "Invoice amount in cents"),
                field("payment_status", String, "Payment status"),
                field("paid_at", Datetime, "When the payment was received"),
                field("is_paid", Boolean, "Payment status"),
            ],
        )
}
