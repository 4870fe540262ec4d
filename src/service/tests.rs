//! Unit tests for the service wrapper.

use rstest::{fixture, rstest};

use super::*;
use crate::actions::{
    ConnectSubnetAction, ConnectSubnetParams, CreateKeysAction, DeployAppAction, DeployAppParams,
    DeploymentSelection, PrepareCloudInfraAction, PrepareCloudInfraParams, PrepareSubnetAction,
    PrepareSubnetParams,
};
use crate::cancellation::CancellationToken;
use crate::deployment::{
    ANGEL_DEPLOYMENT_PATH, AngelDeployment, CloudProfile, MAN_DEPLOYMENT_PATH, ManDeployment,
};
use crate::results::ActionResult;
use crate::test_support::{RecordingClient, RecordingSession, test_context, test_resource};

#[fixture]
fn client() -> RecordingClient {
    RecordingClient::new()
}

#[fixture]
fn session() -> RecordingSession {
    RecordingSession::new()
}

fn deploy_action(path: &str) -> DeployAppAction {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(String::from("User"), String::from("gabriel"));
    attributes.insert(String::from("Password"), String::from("enc:halo"));
    DeployAppAction {
        action_id: String::from("deploy-1"),
        action_params: DeployAppParams {
            app_name: String::from("cherub"),
            deployment: DeploymentSelection {
                deployment_path: path.to_owned(),
                custom_model: serde_json::Value::Null,
            },
            app_resource: crate::actions::AppResource { attributes },
        },
    }
}

fn angel_model() -> AngelDeployment {
    AngelDeployment {
        wing_count: 4,
        flight_speed: String::from("fast"),
        cloud: CloudProfile {
            cloud_size: String::from("small"),
            cloud_image_id: String::from("img-1"),
        },
    }
}

fn man_model() -> ManDeployment {
    ManDeployment {
        weight: 80,
        height: 180,
        cloud: CloudProfile {
            cloud_size: String::from("large"),
            cloud_image_id: String::from("img-2"),
        },
    }
}

fn connect_action(id: &str, subnet_id: &str) -> ConnectSubnetAction {
    ConnectSubnetAction {
        action_id: id.to_owned(),
        action_params: ConnectSubnetParams {
            subnet_id: subnet_id.to_owned(),
        },
    }
}

fn infra_action() -> PrepareCloudInfraAction {
    PrepareCloudInfraAction {
        action_id: String::from("infra-1"),
        action_params: PrepareCloudInfraParams {
            cidr: String::from("10.0.0.0/24"),
        },
    }
}

fn keys_action() -> CreateKeysAction {
    CreateKeysAction {
        action_id: String::from("keys-1"),
    }
}

fn subnet_action(id: &str, cidr: &str) -> PrepareSubnetAction {
    PrepareSubnetAction {
        action_id: id.to_owned(),
        action_params: PrepareSubnetParams {
            cidr: cidr.to_owned(),
            is_public: false,
            subnet_service_attributes: std::collections::BTreeMap::new(),
        },
    }
}

fn details_batch(count: usize) -> String {
    let items: Vec<serde_json::Value> = (0..count)
        .map(|index| {
            serde_json::json!({
                "deployedAppJson": {
                    "name": format!("app{index}"),
                    "address": format!("10.0.0.{index}"),
                    "vmdetails": {"uid": format!("vm-{index}")}
                }
            })
        })
        .collect();
    serde_json::json!({ "items": items }).to_string()
}

#[rstest]
fn angel_deploy_returns_deploy_plus_subnet_results(
    client: RecordingClient,
    session: RecordingSession,
) {
    let service = CloudService::new(&client);
    let action = deploy_action(ANGEL_DEPLOYMENT_PATH);
    let first = connect_action("connect-1", "sub-a");
    let second = connect_action("connect-2", "sub-b");

    let results = service
        .deploy_angel(
            &test_context(),
            &session,
            &test_resource(),
            &action,
            &angel_model(),
            &[&first, &second],
            &CancellationToken::new(),
        )
        .expect("deploy should produce results");

    assert_eq!(results.len(), 3);
    let ids: Vec<&str> = results.iter().map(ActionResult::action_id).collect();
    assert_eq!(ids, vec!["deploy-1", "connect-1", "connect-2"]);
    assert!(results.iter().all(ActionResult::succeeded));

    let Some(ActionResult::DeployApp(deploy)) = results.first() else {
        panic!("first result should be the deploy result");
    };
    assert!(deploy.vm_name.starts_with("cherub__"));
    assert_eq!(deploy.vm_uuid, "vm-angel-1");
    assert_eq!(deploy.deployed_app_address, "10.0.0.7");
    assert_eq!(
        deploy
            .deployed_app_additional_data
            .get("Reservation Id")
            .map(String::as_str),
        Some("res-1234")
    );
    assert!(
        deploy
            .deployed_app_attributes
            .iter()
            .any(|attribute| attribute.attribute_name == "Password"
                && attribute.attribute_value == "halo_decrypted")
    );

    let Some(ActionResult::ConnectToSubnet(connect)) = results.get(1) else {
        panic!("second result should be a subnet attachment");
    };
    assert_eq!(connect.interface, "nic-0");
}

#[rstest]
fn cancelled_deploy_rolls_back_and_never_creates(
    client: RecordingClient,
    session: RecordingSession,
) {
    let service = CloudService::new(&client);
    let token = CancellationToken::new();
    token.cancel();

    let results = service
        .deploy_angel(
            &test_context(),
            &session,
            &test_resource(),
            &deploy_action(ANGEL_DEPLOYMENT_PATH),
            &angel_model(),
            &[],
            &token,
        )
        .expect("cancelled deploy still yields a result");

    assert_eq!(results.len(), 1);
    let Some(ActionResult::DeployApp(deploy)) = results.first() else {
        panic!("expected a deploy result");
    };
    assert!(!deploy.success);
    assert_eq!(deploy.error_message, CANCELLED_MESSAGE);

    let calls = client.calls();
    assert!(calls.contains(&String::from("rollback")));
    assert!(!calls.contains(&String::from("create_angel_instance")));
}

#[rstest]
fn creation_failure_becomes_a_failed_result(client: RecordingClient, session: RecordingSession) {
    client.fail_operation("create_man_instance");
    let service = CloudService::new(&client);

    let results = service
        .deploy_man(
            &test_context(),
            &session,
            &test_resource(),
            &deploy_action(MAN_DEPLOYMENT_PATH),
            &man_model(),
            &CancellationToken::new(),
        )
        .expect("provider failure is captured, not raised");

    assert_eq!(results.len(), 1);
    let Some(ActionResult::DeployApp(deploy)) = results.first() else {
        panic!("expected a deploy result");
    };
    assert!(!deploy.success);
    assert!(deploy.error_message.contains("create_man_instance exploded"));
    assert_eq!(deploy.action_id, "deploy-1");
}

#[rstest]
fn man_deploy_returns_a_single_result(client: RecordingClient, session: RecordingSession) {
    let service = CloudService::new(&client);

    let results = service
        .deploy_man(
            &test_context(),
            &session,
            &test_resource(),
            &deploy_action(MAN_DEPLOYMENT_PATH),
            &man_model(),
            &CancellationToken::new(),
        )
        .expect("deploy should produce a result");

    assert_eq!(results.len(), 1);
    assert_eq!(
        results.first().map(ActionResult::action_id),
        Some("deploy-1")
    );
    assert!(client.calls().contains(&String::from("create_man_instance")));
}

#[test]
fn network_projection_has_two_interfaces_primary_first() {
    let interfaces = extract_vm_instance_network_data();
    assert_eq!(interfaces.len(), 2);
    let Some(first) = interfaces.first() else {
        panic!("projection should have a first interface");
    };
    let Some(second) = interfaces.get(1) else {
        panic!("projection should have a second interface");
    };
    assert!(first.is_primary);
    assert!(!second.is_primary);
    assert_eq!(first.private_ip_address, "10.0.0.0");
    assert_eq!(second.private_ip_address, "10.0.0.1");
}

#[test]
fn instance_rows_fall_back_to_dummy_name() {
    let rows = extract_vm_instance_data(None);
    assert!(
        rows.iter()
            .any(|row| row.key == "Instance Name" && row.value == "dummy")
    );
    assert!(rows.iter().any(|row| row.key == "Hidden stuff" && row.hidden));
}

#[rstest]
fn details_batch_is_answered_per_vm(client: RecordingClient) {
    let service = CloudService::new(&client);
    let results = service
        .get_vm_details(
            &test_resource(),
            &CancellationToken::new(),
            &details_batch(3),
        )
        .expect("batch should succeed");

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.first().and_then(|details| details.app_name.as_deref()),
        Some("app0")
    );
}

#[rstest]
fn details_batch_stops_early_on_cancellation(client: RecordingClient) {
    let token = CancellationToken::new();
    client.cancel_after_lookups(2, &token);
    let service = CloudService::new(&client);

    let results = service
        .get_vm_details(&test_resource(), &token, &details_batch(3))
        .expect("partial batch is still a success");

    assert_eq!(results.len(), 2);
    assert_eq!(
        client
            .calls()
            .iter()
            .filter(|call| call.as_str() == "get_instance")
            .count(),
        2
    );
}

#[rstest]
fn sandbox_preparation_yields_one_result_per_stage(client: RecordingClient) {
    let service = CloudService::new(&client);
    let first_subnet = subnet_action("subnet-1", "10.0.1.0/28");
    let second_subnet = subnet_action("subnet-2", "10.0.2.0/28");

    let results = service
        .prepare_sandbox_infra(
            &test_resource(),
            &infra_action(),
            &keys_action(),
            &[&first_subnet, &second_subnet],
            &CancellationToken::new(),
        )
        .expect("pipeline should complete");

    assert_eq!(results.len(), 4);
    let ids: Vec<&str> = results.iter().map(ActionResult::action_id).collect();
    assert_eq!(ids, vec!["infra-1", "keys-1", "subnet-1", "subnet-2"]);
    assert!(results.iter().all(ActionResult::succeeded));
}

#[rstest]
#[case::infra("prepare_infra", 0)]
#[case::keys("get_or_create_ssh_key", 1)]
#[case::subnet("prepare_subnet", 2)]
fn stage_failure_does_not_abort_the_pipeline(
    client: RecordingClient,
    #[case] operation: &'static str,
    #[case] failed_index: usize,
) {
    client.fail_operation(operation);
    let service = CloudService::new(&client);
    let subnet = subnet_action("subnet-1", "10.0.1.0/28");

    let results = service
        .prepare_sandbox_infra(
            &test_resource(),
            &infra_action(),
            &keys_action(),
            &[&subnet],
            &CancellationToken::new(),
        )
        .expect("pipeline runs every stage");

    assert_eq!(results.len(), 3);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.succeeded(), index != failed_index);
    }
}

#[rstest]
fn cancellation_between_stages_aborts_the_pipeline(client: RecordingClient) {
    let token = CancellationToken::new();
    token.cancel();
    let service = CloudService::new(&client);

    let outcome = service.prepare_sandbox_infra(
        &test_resource(),
        &infra_action(),
        &keys_action(),
        &[],
        &token,
    );

    assert_eq!(outcome, Err(crate::error::DriverError::Cancelled));
    assert!(client.calls().is_empty());
}

#[rstest]
fn refresh_pushes_address_and_public_ip_once(client: RecordingClient, session: RecordingSession) {
    client.set_refresh_ip("10.0.0.9");
    let service = CloudService::new(&client);

    service
        .remote_refresh_ip(
            &test_resource(),
            &session,
            "Sandbox/app1",
            "vm-1",
            "10.0.0.5",
            None,
        )
        .expect("refresh should succeed");

    let addresses = session.address_updates();
    assert_eq!(
        addresses,
        vec![(String::from("Sandbox/app1"), String::from("10.0.0.9"))]
    );

    let attributes = session.attribute_updates();
    assert_eq!(attributes.len(), 1);
    let Some((fullname, attribute, value)) = attributes.first() else {
        panic!("expected one attribute update");
    };
    assert_eq!(fullname, "Sandbox/app1");
    assert_eq!(attribute, PUBLIC_IP_ATTRIBUTE);
    assert!(value.starts_with("1.1.1."));
}

#[rstest]
fn refresh_is_quiet_when_nothing_changed(client: RecordingClient, session: RecordingSession) {
    client.set_refresh_ip("10.0.0.5");
    let service = CloudService::new(&client);

    service
        .remote_refresh_ip(
            &test_resource(),
            &session,
            "Sandbox/app1",
            "vm-1",
            "10.0.0.5",
            Some("1.1.1.7"),
        )
        .expect("refresh should succeed");

    assert!(session.address_updates().is_empty());
    assert!(session.attribute_updates().is_empty());
}

#[rstest]
fn cleanup_acknowledges_the_action(client: RecordingClient) {
    let service = CloudService::new(&client);
    let action = crate::actions::CleanupNetworkAction {
        action_id: String::from("cleanup-1"),
    };

    let result = service.cleanup_sandbox_infra(&test_resource(), &action);

    assert_eq!(result.action_id(), "cleanup-1");
    assert!(result.succeeded());
    // No provider teardown happens in this version.
    assert!(client.calls().is_empty());
}

#[rstest]
#[case::on("power_on")]
#[case::off("power_off")]
#[case::delete("delete_instance")]
fn power_commands_pass_straight_through(client: RecordingClient, #[case] operation: &'static str) {
    let service = CloudService::new(&client);
    let resource = test_resource();

    let outcome = match operation {
        "power_on" => service.power_on(&resource, "vm-1"),
        "power_off" => service.power_off(&resource, "vm-1"),
        _ => service.delete_instance(&resource, "vm-1"),
    };

    assert!(outcome.is_ok());
    assert_eq!(client.calls(), vec![operation.to_owned()]);
}
