//! In-memory domain collaborators backing the stock catalog.
//!
//! Lets `gatehoused` run end-to-end without real HR, finance, sales, or
//! support systems behind it: every stock tool gets a handler over a shared,
//! deterministically seeded dataset. The employee table is seeded past the
//! default row ceiling on purpose, so an unfiltered `list_employees` shows
//! truncation on first contact.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use gatehouse_core::{ChangePreview, FieldChange, ToolDescriptor};
use gatehouse_tools::{RegistryError, ToolHandler, ToolRegistry, UpstreamError, UpstreamResult};

// ---------- Dataset ----------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Employee {
    employee_id: String,
    name: String,
    department: String,
    salary: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Invoice {
    invoice_id: String,
    customer: String,
    status: String,
    amount: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Opportunity {
    opportunity_id: String,
    account: String,
    stage: String,
    value: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Ticket {
    ticket_id: String,
    subject: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalesRep {
    rep_id: String,
    name: String,
    quota: u64,
}

/// Shared mutable tables behind all demo handlers.
struct DemoData {
    employees: RwLock<Vec<Employee>>,
    invoices: RwLock<Vec<Invoice>>,
    opportunities: RwLock<Vec<Opportunity>>,
    tickets: RwLock<Vec<Ticket>>,
    reps: RwLock<Vec<SalesRep>>,
}

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Blake", "Casey", "Devon", "Ellis", "Finley", "Gray", "Harper", "Indra", "Jules",
    "Kai", "Logan",
];

const LAST_NAMES: [&str; 7] = [
    "Okafor",
    "Lindqvist",
    "Tanaka",
    "Moreau",
    "Adeyemi",
    "Petrov",
    "Castillo",
];

impl DemoData {
    fn seeded() -> Self {
        let departments = ["engineering", "sales", "support", "finance", "people"];
        let salaries = [58_000_u64, 63_500, 71_000, 84_000, 92_500, 110_000];
        let employees: Vec<Employee> = (1..=60_u32)
            .zip(FIRST_NAMES.iter().cycle())
            .zip(LAST_NAMES.iter().cycle())
            .zip(departments.iter().cycle())
            .zip(salaries.iter().cycle())
            .map(|((((n, first), last), department), salary)| Employee {
                employee_id: format!("emp-{n:03}"),
                name: format!("{first} {last}"),
                department: (*department).to_string(),
                salary: *salary,
            })
            .collect();

        let customers = [
            "Northwind Traders",
            "Fabrikam",
            "Contoso",
            "Tailspin Toys",
            "Wide World Importers",
        ];
        let invoice_statuses = ["draft", "sent", "paid", "overdue"];
        let amounts = [1_250_u64, 4_800, 975, 16_400, 2_300, 7_150];
        let invoices: Vec<Invoice> = (1..=12_u32)
            .zip(customers.iter().cycle())
            .zip(invoice_statuses.iter().cycle())
            .zip(amounts.iter().cycle())
            .map(|(((n, customer), status), amount)| Invoice {
                invoice_id: format!("inv-{n:04}"),
                customer: (*customer).to_string(),
                status: (*status).to_string(),
                amount: *amount,
            })
            .collect();

        let stages = [
            "prospecting",
            "qualification",
            "proposal",
            "negotiation",
            "closed-won",
        ];
        let deal_values = [18_000_u64, 42_000, 95_000, 130_000];
        let opportunities: Vec<Opportunity> = (1..=10_u32)
            .zip(customers.iter().cycle())
            .zip(stages.iter().cycle())
            .zip(deal_values.iter().cycle())
            .map(|(((n, account), stage), value)| Opportunity {
                opportunity_id: format!("opp-{n:02}"),
                account: (*account).to_string(),
                stage: (*stage).to_string(),
                value: *value,
            })
            .collect();

        let subjects = [
            "Cannot sign in",
            "Invoice total looks wrong",
            "Export hangs at 90%",
            "Password reset email never arrives",
            "Dashboard shows stale data",
        ];
        let ticket_statuses = ["open", "investigating", "waiting-on-customer", "closed"];
        let tickets: Vec<Ticket> = (1..=15_u32)
            .zip(subjects.iter().cycle())
            .zip(ticket_statuses.iter().cycle())
            .map(|((n, subject), status)| Ticket {
                ticket_id: format!("tkt-{n:03}"),
                subject: (*subject).to_string(),
                status: (*status).to_string(),
                resolution: None,
            })
            .collect();

        let quotas = [250_000_u64, 400_000, 320_000, 520_000];
        let reps: Vec<SalesRep> = (1..=6_u32)
            .zip(FIRST_NAMES.iter().rev().cycle())
            .zip(LAST_NAMES.iter().rev().cycle())
            .zip(quotas.iter().cycle())
            .map(|(((n, first), last), quota)| SalesRep {
                rep_id: format!("rep-{n:02}"),
                name: format!("{first} {last}"),
                quota: *quota,
            })
            .collect();

        Self {
            employees: RwLock::new(employees),
            invoices: RwLock::new(invoices),
            opportunities: RwLock::new(opportunities),
            tickets: RwLock::new(tickets),
            reps: RwLock::new(reps),
        }
    }
}

fn read_table<T>(table: &RwLock<Vec<T>>) -> RwLockReadGuard<'_, Vec<T>> {
    table.read().unwrap_or_else(|e| {
        tracing::warn!("demo dataset lock poisoned, recovering");
        e.into_inner()
    })
}

fn write_table<T>(table: &RwLock<Vec<T>>) -> RwLockWriteGuard<'_, Vec<T>> {
    table.write().unwrap_or_else(|e| {
        tracing::warn!("demo dataset lock poisoned, recovering");
        e.into_inner()
    })
}

fn to_row<T: Serialize>(record: &T) -> UpstreamResult<Value> {
    serde_json::to_value(record).map_err(|e| UpstreamError::Failed(e.to_string()))
}

fn require_str<'a>(params: &'a Value, key: &str) -> UpstreamResult<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| UpstreamError::Failed(format!("{key} is required")))
}

fn require_u64(params: &Value, key: &str) -> UpstreamResult<u64> {
    params
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| UpstreamError::Failed(format!("{key} is required")))
}

// ---------- Handlers ----------

struct ListEmployees {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for ListEmployees {
    async fn fetch(&self, params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
        let department = params.get("department").and_then(Value::as_str);
        read_table(&self.data.employees)
            .iter()
            .filter(|e| department.is_none_or(|d| e.department == d))
            .take(limit)
            .map(to_row)
            .collect()
    }
}

struct GetEmployee {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for GetEmployee {
    async fn fetch(&self, params: &Value, _limit: usize) -> UpstreamResult<Vec<Value>> {
        let id = require_str(params, "employeeId")?;
        let employees = read_table(&self.data.employees);
        let employee = employees
            .iter()
            .find(|e| e.employee_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("employee {id}")))?;
        Ok(vec![to_row(employee)?])
    }
}

struct UpdateSalary {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for UpdateSalary {
    async fn preview(&self, params: &Value) -> UpstreamResult<ChangePreview> {
        let id = require_str(params, "employeeId")?;
        let new_salary = require_u64(params, "newSalary")?;
        let employees = read_table(&self.data.employees);
        let employee = employees
            .iter()
            .find(|e| e.employee_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("employee {id}")))?;

        Ok(ChangePreview::new(format!(
            "Change salary for {} ({id}) from {} to {new_salary}",
            employee.name, employee.salary
        ))
        .with_change(
            FieldChange::new("salary", json!(new_salary)).with_old(json!(employee.salary)),
        ))
    }

    async fn apply(&self, params: &Value) -> UpstreamResult<Value> {
        let id = require_str(params, "employeeId")?;
        let new_salary = require_u64(params, "newSalary")?;
        let mut employees = write_table(&self.data.employees);
        let employee = employees
            .iter_mut()
            .find(|e| e.employee_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("employee {id}")))?;
        employee.salary = new_salary;
        to_row(employee)
    }
}

struct ListInvoices {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for ListInvoices {
    async fn fetch(&self, params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
        let status = params.get("status").and_then(Value::as_str);
        read_table(&self.data.invoices)
            .iter()
            .filter(|i| status.is_none_or(|s| i.status == s))
            .take(limit)
            .map(to_row)
            .collect()
    }
}

struct DeleteInvoice {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for DeleteInvoice {
    async fn preview(&self, params: &Value) -> UpstreamResult<ChangePreview> {
        let id = require_str(params, "invoiceId")?;
        let invoices = read_table(&self.data.invoices);
        let invoice = invoices
            .iter()
            .find(|i| i.invoice_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("invoice {id}")))?;

        Ok(ChangePreview::new(format!(
            "Delete invoice {id} for {} ({}, {})",
            invoice.customer, invoice.status, invoice.amount
        ))
        .with_change(FieldChange::new("invoice", Value::Null).with_old(to_row(invoice)?)))
    }

    async fn apply(&self, params: &Value) -> UpstreamResult<Value> {
        let id = require_str(params, "invoiceId")?;
        let mut invoices = write_table(&self.data.invoices);
        let before = invoices.len();
        invoices.retain(|i| i.invoice_id != id);
        if invoices.len() == before {
            return Err(UpstreamError::NotFound(format!("invoice {id}")));
        }
        Ok(json!({ "deleted": id }))
    }
}

struct ListOpportunities {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for ListOpportunities {
    async fn fetch(&self, params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
        let stage = params.get("stage").and_then(Value::as_str);
        read_table(&self.data.opportunities)
            .iter()
            .filter(|o| stage.is_none_or(|s| o.stage == s))
            .take(limit)
            .map(to_row)
            .collect()
    }
}

struct UpdateQuota {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for UpdateQuota {
    async fn preview(&self, params: &Value) -> UpstreamResult<ChangePreview> {
        let id = require_str(params, "repId")?;
        let new_quota = require_u64(params, "newQuota")?;
        let reps = read_table(&self.data.reps);
        let rep = reps
            .iter()
            .find(|r| r.rep_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("sales rep {id}")))?;

        Ok(ChangePreview::new(format!(
            "Change quota for {} ({id}) from {} to {new_quota}",
            rep.name, rep.quota
        ))
        .with_change(FieldChange::new("quota", json!(new_quota)).with_old(json!(rep.quota))))
    }

    async fn apply(&self, params: &Value) -> UpstreamResult<Value> {
        let id = require_str(params, "repId")?;
        let new_quota = require_u64(params, "newQuota")?;
        let mut reps = write_table(&self.data.reps);
        let rep = reps
            .iter_mut()
            .find(|r| r.rep_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("sales rep {id}")))?;
        rep.quota = new_quota;
        to_row(rep)
    }
}

struct ListTickets {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for ListTickets {
    async fn fetch(&self, params: &Value, limit: usize) -> UpstreamResult<Vec<Value>> {
        let status = params.get("status").and_then(Value::as_str);
        read_table(&self.data.tickets)
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .take(limit)
            .map(to_row)
            .collect()
    }
}

struct CloseTicket {
    data: Arc<DemoData>,
}

#[async_trait]
impl ToolHandler for CloseTicket {
    async fn preview(&self, params: &Value) -> UpstreamResult<ChangePreview> {
        let id = require_str(params, "ticketId")?;
        let tickets = read_table(&self.data.tickets);
        let ticket = tickets
            .iter()
            .find(|t| t.ticket_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("ticket {id}")))?;
        if ticket.status == "closed" {
            return Err(UpstreamError::Failed(format!("ticket {id} is already closed")));
        }

        let mut preview = ChangePreview::new(format!("Close ticket {id}: {}", ticket.subject))
            .with_change(FieldChange::new("status", json!("closed")).with_old(json!(ticket.status)));
        if let Some(resolution) = params.get("resolution").and_then(Value::as_str) {
            preview = preview.with_change(FieldChange::new("resolution", json!(resolution)));
        }
        Ok(preview)
    }

    async fn apply(&self, params: &Value) -> UpstreamResult<Value> {
        let id = require_str(params, "ticketId")?;
        let resolution = params.get("resolution").and_then(Value::as_str);
        let mut tickets = write_table(&self.data.tickets);
        let ticket = tickets
            .iter_mut()
            .find(|t| t.ticket_id == id)
            .ok_or_else(|| UpstreamError::NotFound(format!("ticket {id}")))?;
        ticket.status = "closed".to_string();
        if let Some(resolution) = resolution {
            ticket.resolution = Some(resolution.to_string());
        }
        to_row(ticket)
    }
}

// ---------- Wiring ----------

/// Build a registry pairing every stock catalog entry with its demo handler.
///
/// Catalog entries with no demo collaborator are logged and skipped rather
/// than failing the daemon, so a config that adds tools beyond the stock set
/// still starts — those tools just are not served by this dataset.
///
/// # Errors
///
/// Returns a [`RegistryError`] when the catalog itself is invalid, for
/// example a duplicated tool name.
pub fn demo_registry(descriptors: Vec<ToolDescriptor>) -> Result<ToolRegistry, RegistryError> {
    let data = Arc::new(DemoData::seeded());
    let mut builder = ToolRegistry::builder();

    for descriptor in descriptors {
        let data = Arc::clone(&data);
        let handler: Arc<dyn ToolHandler> = match descriptor.name.as_str() {
            "list_employees" => Arc::new(ListEmployees { data }),
            "get_employee" => Arc::new(GetEmployee { data }),
            "update_salary" => Arc::new(UpdateSalary { data }),
            "list_invoices" => Arc::new(ListInvoices { data }),
            "delete_invoice" => Arc::new(DeleteInvoice { data }),
            "list_opportunities" => Arc::new(ListOpportunities { data }),
            "update_quota" => Arc::new(UpdateQuota { data }),
            "list_tickets" => Arc::new(ListTickets { data }),
            "close_ticket" => Arc::new(CloseTicket { data }),
            other => {
                tracing::warn!(tool = %other, "no demo collaborator for catalog entry, skipping");
                continue;
            },
        };
        builder = builder.register(descriptor, handler)?;
    }

    Ok(builder.build())
}
