//! Employee collection queries: equality filters, ordering, cursor paging.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use orgdesk_core::{DepartmentId, DomainError, EmployeeId};
use orgdesk_directory::{Email, Employee, EmployeeSortField, SortDirection, SortValue};

/// Equality predicate on an employee field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeFilter {
    DepartmentIs(DepartmentId),
    EmailIs(Email),
    ManagerIs(EmployeeId),
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        match self {
            EmployeeFilter::DepartmentIs(id) => employee.department_id == *id,
            EmployeeFilter::EmailIs(email) => employee.email == *email,
            EmployeeFilter::ManagerIs(id) => employee.manager_id == Some(*id),
        }
    }
}

/// Opaque pointer to the last record of a page (forward-only paging).
///
/// A cursor is only meaningful for the ordering it was produced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    field: EmployeeSortField,
    direction: SortDirection,
    value: SortValue,
    id: EmployeeId,
}

impl PageCursor {
    pub fn after(employee: &Employee, field: EmployeeSortField, direction: SortDirection) -> Self {
        Self {
            field,
            direction,
            value: employee.sort_value(field),
            id: employee.id,
        }
    }

    pub fn field(&self) -> EmployeeSortField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Serialize into a token the caller can hold without inspecting it.
    pub fn encode(&self) -> Result<String, DomainError> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::invariant(format!("unencodable page cursor: {e}")))
    }

    pub fn decode(token: &str) -> Result<Self, DomainError> {
        serde_json::from_str(token)
            .map_err(|e| DomainError::validation(format!("malformed page cursor: {e}")))
    }

    fn key(&self) -> (&SortValue, EmployeeId) {
        (&self.value, self.id)
    }
}

/// Query over the `employees` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeQuery {
    filters: Vec<EmployeeFilter>,
    order: Option<(EmployeeSortField, SortDirection)>,
    start_after: Option<PageCursor>,
    limit: Option<usize>,
}

impl EmployeeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// All members of a department.
    pub fn members_of(department_id: DepartmentId) -> Self {
        Self::new().filter(EmployeeFilter::DepartmentIs(department_id))
    }

    pub fn filter(mut self, filter: EmployeeFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: EmployeeSortField, direction: SortDirection) -> Self {
        self.order = Some((field, direction));
        self
    }

    pub fn start_after(mut self, cursor: PageCursor) -> Self {
        self.start_after = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[EmployeeFilter] {
        &self.filters
    }

    pub fn order(&self) -> Option<(EmployeeSortField, SortDirection)> {
        self.order
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.start_after.as_ref()
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        self.filters.iter().all(|f| f.matches(employee))
    }

    /// Check that the cursor (if any) belongs to this query's ordering.
    pub fn validate(&self) -> Result<(), String> {
        let Some(cursor) = &self.start_after else {
            return Ok(());
        };
        match self.order {
            Some((field, direction))
                if field == cursor.field && direction == cursor.direction =>
            {
                Ok(())
            }
            Some((field, direction)) => Err(format!(
                "cursor ordered by {:?} {:?} used with query ordered by {field:?} {direction:?}",
                cursor.field, cursor.direction
            )),
            None => Err("cursor used with an unordered query".to_string()),
        }
    }

    /// Total order used to sort results. Ties are broken by id so cursors are stable.
    pub fn compare(&self, a: &Employee, b: &Employee) -> Ordering {
        match self.order {
            Some((field, direction)) => directed(
                (&a.sort_value(field), a.id).cmp(&(&b.sort_value(field), b.id)),
                direction,
            ),
            None => a.id.cmp(&b.id),
        }
    }

    /// Whether `employee` sorts strictly after the query cursor.
    pub fn is_after_cursor(&self, employee: &Employee) -> bool {
        let (Some(cursor), Some((field, direction))) = (&self.start_after, self.order) else {
            return true;
        };
        let value = employee.sort_value(field);
        directed(cursor.key().cmp(&(&value, employee.id)), direction) == Ordering::Less
    }

    /// Apply this query to a set of records: filter, order, skip past the cursor, limit.
    pub fn run<'a, I>(&self, records: I) -> Vec<Employee>
    where
        I: IntoIterator<Item = &'a Employee>,
    {
        let mut hits: Vec<&Employee> = records
            .into_iter()
            .filter(|e| self.matches(e) && self.is_after_cursor(e))
            .collect();
        hits.sort_by(|a, b| self.compare(a, b));

        let limit = self.limit.unwrap_or(usize::MAX);
        hits.into_iter().take(limit).cloned().collect()
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
