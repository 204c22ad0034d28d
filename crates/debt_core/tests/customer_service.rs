use debt_core::db::open_db_in_memory;
use debt_core::{
    Customer, CustomerKey, CustomerRepository, CustomerService, RepoError, RepoResult,
    SqliteCustomerRepository,
};

fn customer(customer_id: &str, name: &str) -> Customer {
    Customer::new(customer_id, name, "0987654321", "Can Tho")
}

/// Answers "absent" to every existence check, as if another writer claimed
/// the key between the service's check and its save.
struct StaleExistsRepository<'conn> {
    inner: SqliteCustomerRepository<'conn>,
}

impl CustomerRepository for StaleExistsRepository<'_> {
    fn save(&self, customer: &Customer) -> RepoResult<Customer> {
        self.inner.save(customer)
    }

    fn find_by_id(&self, id: CustomerKey) -> RepoResult<Option<Customer>> {
        self.inner.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Customer>> {
        self.inner.find_all()
    }

    fn delete_by_id(&self, id: CustomerKey) -> RepoResult<usize> {
        self.inner.delete_by_id(id)
    }

    fn count(&self) -> RepoResult<u64> {
        self.inner.count()
    }

    fn find_by_customer_id(&self, customer_id: &str) -> RepoResult<Option<Customer>> {
        self.inner.find_by_customer_id(customer_id)
    }

    fn exists_by_customer_id(&self, _customer_id: &str) -> RepoResult<bool> {
        Ok(false)
    }

    fn delete_by_customer_id(&self, customer_id: &str) -> RepoResult<usize> {
        self.inner.delete_by_customer_id(customer_id)
    }
}

#[test]
fn create_assigns_key_and_ignores_caller_key() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());

    let created = service
        .create_customer(&customer("KH01", "Pham Van D").with_key(500))
        .unwrap();

    assert!(created.id.is_some());
    assert_ne!(created.id, Some(500));
    assert_eq!(
        service.get_customer("KH01").unwrap().unwrap().name,
        "Pham Van D"
    );
}

#[test]
fn create_rejects_taken_business_key() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    service.create_customer(&customer("KH01", "first")).unwrap();

    let err = service
        .create_customer(&customer("KH01", "second"))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateCustomerId(ref id) if id == "KH01"));
    assert_eq!(service.list_customers().unwrap().len(), 1);
}

#[test]
fn create_rejects_incomplete_input() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());

    let err = service.create_customer(&customer("KH01", " ")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn update_keeps_key_and_can_rename_business_key() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    let created = service.create_customer(&customer("KH01", "old")).unwrap();

    let updated = service
        .update_customer("KH01", &customer("KH99", "new"))
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert!(service.get_customer("KH01").unwrap().is_none());
    assert_eq!(service.get_customer("KH99").unwrap().unwrap().name, "new");
}

#[test]
fn update_missing_customer_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());

    let err = service
        .update_customer("KH404", &customer("KH404", "ghost"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ref id) if id == "KH404"));
}

#[test]
fn update_onto_another_customers_key_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    service.create_customer(&customer("KH01", "one")).unwrap();
    service.create_customer(&customer("KH02", "two")).unwrap();

    let err = service
        .update_customer("KH01", &customer("KH02", "clash"))
        .unwrap_err();

    assert!(matches!(err, RepoError::DuplicateCustomerId(_)));
    assert_eq!(service.get_customer("KH01").unwrap().unwrap().name, "one");
}

#[test]
fn delete_is_idempotent_through_service() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    service.create_customer(&customer("KH01", "one")).unwrap();

    assert_eq!(service.delete_customer("KH01").unwrap(), 1);
    assert_eq!(service.delete_customer("KH01").unwrap(), 0);
    assert!(service.list_customers().unwrap().is_empty());
}

#[test]
fn key_claimed_between_check_and_save_is_reported_as_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let service = CustomerService::new(StaleExistsRepository {
        inner: SqliteCustomerRepository::try_new(&conn).unwrap(),
    });
    service.create_customer(&customer("KH01", "first")).unwrap();
    service.create_customer(&customer("KH02", "second")).unwrap();

    let err = service
        .create_customer(&customer("KH01", "late"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateCustomerId(ref id) if id == "KH01"));

    let err = service
        .update_customer("KH02", &customer("KH01", "rename"))
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateCustomerId(ref id) if id == "KH01"));

    assert_eq!(service.get_customer("KH01").unwrap().unwrap().name, "first");
    assert_eq!(service.get_customer("KH02").unwrap().unwrap().name, "second");
}
