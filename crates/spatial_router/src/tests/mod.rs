//! End-to-end scenarios across the server, router, and collision engine


use std::sync::Arc;

use crate::capability::RootCapabilities;
use crate::config::ServerConfig;
use crate::events::{GrabEvent, GrabEventType, MouseEvent, MouseEventType};
use crate::foundation::math::{Mat4, Vec3};
use crate::ids::{AppId, ClientId, GlobalNodeId};
use crate::intersections::QueryError;
use crate::physics::CollisionEngine;
use crate::router::RouteOutcome;
use crate::scene::{Node, NodeType, SceneGraphSnapshot};
use crate::server::Server;
use fakes::{RecordingGrabbable, RecordingGrabber, RecordingPanel, RecordingPoker};

fn graph(nodes: &[(u32, NodeType)]) -> SceneGraphSnapshot {
    nodes.iter().map(|&(id, node_type)| Node::new(id, node_type)).collect()
}

fn at(x: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, 0.0, 0.0))
}

fn mouse(panel_id: GlobalNodeId, event_type: MouseEventType) -> MouseEvent {
    MouseEvent {
        panel_id,
        event_type,
        x: 0.5,
        y: 0.25,
    }
}

#[test]
fn test_mouse_event_reaches_panel_of_another_app() {
    let mut server = Server::new(ServerConfig::default());
    let browser = server.create_app(ClientId(1), "browser").unwrap();
    let pointer = server.create_app(ClientId(2), "pointer").unwrap();

    let panel = Arc::new(RecordingPanel::default());
    let roots = RootCapabilities {
        panel: Some(panel.clone()),
        ..Default::default()
    };
    server.submit_scene_graph(browser, graph(&[(7, NodeType::Panel)]), roots).unwrap();

    let target = GlobalNodeId::new(browser, 7);
    let outcome = server.submit_mouse_event(pointer, 3, mouse(target, MouseEventType::Down)).unwrap();
    assert!(outcome.is_forwarded());
    assert!(panel.calls().is_empty());

    let reports = server.flush_outbound();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].delivered);

    let calls = panel.calls();
    assert_eq!(calls.len(), 1);
    let (local_panel_id, event) = calls[0];
    assert_eq!(local_panel_id, 7);
    assert_eq!(event.panel_id, target);
    assert_eq!(event.poker_id.raw(), (u64::from(pointer.raw()) << 32) | 3);
    assert_eq!(event.event_type, MouseEventType::Down);
}

#[test]
fn test_unknown_target_succeeds_without_request() {
    let mut server = Server::new(ServerConfig::default());
    let pointer = server.create_app(ClientId(1), "pointer").unwrap();

    let nowhere = GlobalNodeId::new(AppId::from_raw(99), 1);
    let outcome = server.submit_mouse_event(pointer, 1, mouse(nowhere, MouseEventType::Move)).unwrap();
    assert_eq!(outcome, RouteOutcome::Dropped);
    assert_eq!(server.pending_outbound(), 0);
}

#[test]
fn test_resubmission_invalidates_old_local_ids() {
    let mut server = Server::new(ServerConfig::default());
    let browser = server.create_app(ClientId(1), "browser").unwrap();
    let pointer = server.create_app(ClientId(2), "pointer").unwrap();
    let roots = RootCapabilities {
        panel: Some(Arc::new(RecordingPanel::default())),
        ..Default::default()
    };

    server.submit_scene_graph(browser, graph(&[(7, NodeType::Panel)]), roots.clone()).unwrap();
    server.submit_scene_graph(browser, graph(&[(8, NodeType::Panel)]), roots).unwrap();

    let stale = server.submit_mouse_event(pointer, 1, mouse(GlobalNodeId::new(browser, 7), MouseEventType::Up));
    let fresh = server.submit_mouse_event(pointer, 1, mouse(GlobalNodeId::new(browser, 8), MouseEventType::Up));
    assert_eq!(stale, Ok(RouteOutcome::Dropped));
    assert!(fresh.unwrap().is_forwarded());
}

#[test]
fn test_disconnect_stops_resolution_but_not_queued_delivery() {
    let mut server = Server::new(ServerConfig::default());
    let toys = server.create_app(ClientId(1), "toys").unwrap();
    let hands = server.create_app(ClientId(2), "hands").unwrap();

    let grabbable = Arc::new(RecordingGrabbable::default());
    let roots = RootCapabilities {
        grabbable: Some(grabbable.clone()),
        ..Default::default()
    };
    server.submit_scene_graph(toys, graph(&[(10, NodeType::Grabbable)]), roots).unwrap();

    let cube = GlobalNodeId::new(toys, 10);
    let start = GrabEvent {
        grabbable_id: cube,
        event_type: GrabEventType::StartGrab,
    };
    assert!(server.submit_grab_event(hands, 4, start).unwrap().is_forwarded());
    assert_eq!(server.grabber_for(cube), Some(GlobalNodeId::new(hands, 4)));

    assert!(server.disconnect(toys));
    assert_eq!(server.grabber_for(cube), None);
    assert_eq!(server.submit_grab_event(hands, 4, start), Ok(RouteOutcome::Dropped));

    // The request issued before the disconnect still reaches its handle
    server.flush_outbound();
    assert_eq!(grabbable.calls().len(), 1);
    assert_eq!(grabbable.calls()[0].1.grabber_id, GlobalNodeId::new(hands, 4));
}

#[test]
fn test_end_grab_from_other_grabber_keeps_pair() {
    let mut server = Server::new(ServerConfig::default());
    let toys = server.create_app(ClientId(1), "toys").unwrap();
    let hands = server.create_app(ClientId(2), "hands").unwrap();
    let roots = RootCapabilities {
        grabbable: Some(Arc::new(RecordingGrabbable::default())),
        ..Default::default()
    };
    server.submit_scene_graph(toys, graph(&[(10, NodeType::Grabbable)]), roots).unwrap();

    let cube = GlobalNodeId::new(toys, 10);
    let event = |event_type| GrabEvent {
        grabbable_id: cube,
        event_type,
    };
    server.submit_grab_event(hands, 1, event(GrabEventType::StartGrab)).unwrap();
    server.submit_grab_event(hands, 2, event(GrabEventType::EndGrab)).unwrap();
    assert_eq!(server.grabber_for(cube), Some(GlobalNodeId::new(hands, 1)));

    server.submit_grab_event(hands, 1, event(GrabEventType::EndGrab)).unwrap();
    assert_eq!(server.grabber_for(cube), None);
}

#[test]
fn test_collision_results_land_in_grabber_store() {
    let mut server = Server::new(ServerConfig::default());
    let toys = server.create_app(ClientId(1), "toys").unwrap();
    let hands = server.create_app(ClientId(2), "hands").unwrap();

    let grabber = Arc::new(RecordingGrabber::default());
    let roots = RootCapabilities {
        grabber: Some(grabber.clone()),
        ..Default::default()
    };
    server.submit_scene_graph(hands, graph(&[(5, NodeType::Grabber)]), roots).unwrap();

    let hand = GlobalNodeId::new(hands, 5);
    let big = GlobalNodeId::new(toys, 10);
    let small = GlobalNodeId::new(toys, 12);

    let mut engine = CollisionEngine::new(server.config().collision.clone());
    engine.reset();
    engine.add_grabber_sphere(hand, &at(0.0), 0.2, true).unwrap();
    engine.add_grabbable_handle_sphere(big, &at(0.0), 0.1).unwrap();
    engine.add_grabbable_handle_sphere(big, &at(0.05), 0.1).unwrap();
    engine.add_grabbable_handle_sphere(small, &at(0.2), 0.1).unwrap();
    engine.add_grabbable_handle_sphere(GlobalNodeId::new(toys, 13), &at(5.0), 0.1).unwrap();

    let results = engine.update_grabber_intersections().unwrap();
    server.publish_grabber_intersections(results);
    assert!(server.flush_outbound().iter().all(|report| report.delivered));

    let mut grabbables = [GlobalNodeId::NULL; 4];
    let mut hooks = [GlobalNodeId::NULL; 1];
    let result = server.app(hands).unwrap().query_grabber_intersection(5, &mut grabbables, &mut hooks).unwrap();
    assert!(result.is_pressed);
    assert_eq!(result.intersection_count, 2);
    assert_eq!(result.hook_count, 0);
    assert_eq!(&grabbables[..2], &[big, small]);

    let pushed = grabber.calls();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].0, 5);
    assert_eq!(pushed[0].1.grabbables, vec![big, small]);
}

#[test]
fn test_query_before_any_result_reports_no_events() {
    let mut server = Server::new(ServerConfig::default());
    let hands = server.create_app(ClientId(1), "hands").unwrap();
    let app = server.app(hands).unwrap();
    assert_eq!(app.query_grabber_intersection(5, &mut [], &mut []), Err(QueryError::NoEvents));
    assert_eq!(app.query_grabber_intersection(0, &mut [], &mut []), Err(QueryError::InvalidParameter));
}

#[test]
fn test_intersections_for_departed_app_are_not_delivered() {
    let mut server = Server::new(ServerConfig::default());
    let hands = server.create_app(ClientId(1), "hands").unwrap();
    let hand = GlobalNodeId::new(hands, 5);

    let mut engine = CollisionEngine::new(server.config().collision.clone());
    engine.reset();
    engine.add_grabber_sphere(hand, &at(0.0), 0.2, false).unwrap();
    engine.add_grabbable_handle_sphere(GlobalNodeId::new(AppId::from_raw(7), 1), &at(0.0), 0.1).unwrap();
    server.publish_grabber_intersections(engine.update_grabber_intersections().unwrap());
    assert_eq!(server.pending_outbound(), 1);

    server.disconnect(hands);
    let reports = server.flush_outbound();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].delivered);

    // Once the app is gone, new results are not even queued
    engine.reset();
    engine.add_grabber_sphere(hand, &at(0.0), 0.2, true).unwrap();
    server.publish_grabber_intersections(engine.update_grabber_intersections().unwrap());
    assert_eq!(server.pending_outbound(), 0);
}

#[test]
fn test_panel_proximity_reaches_poker_owner() {
    let mut server = Server::new(ServerConfig::default());
    let pointer = server.create_app(ClientId(1), "pointer").unwrap();
    let poker = Arc::new(RecordingPoker::default());
    let roots = RootCapabilities {
        poker: Some(poker.clone()),
        ..Default::default()
    };
    server.submit_scene_graph(pointer, graph(&[(2, NodeType::Poker)]), roots).unwrap();

    let panels = vec![GlobalNodeId::new(AppId::from_raw(9), 1)];
    assert!(server.publish_panel_proximity(GlobalNodeId::new(pointer, 2), panels.clone()).is_forwarded());
    assert_eq!(server.publish_panel_proximity(GlobalNodeId::new(pointer, 3), Vec::new()), RouteOutcome::Dropped);

    server.flush_outbound();
    assert_eq!(poker.calls(), vec![(2, panels)]);
}
