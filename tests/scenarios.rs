mod common;

use annotation_canvas::data::{BrushTool, BrushToolType, DrawData, EditData, SliceData};
use annotation_canvas::events::PointerEvent;
use annotation_canvas::rle::RleMask;
use annotation_canvas::{Configuration, Mode, ObjectState, ShapeType};

#[test]
fn rectangle_drag_is_reported_in_image_space() {
    let (recorder, mut canvas) = common::canvas(200.0, 100.0, 10.0);
    canvas.draw(DrawData::shape(ShapeType::Rectangle)).unwrap();
    canvas.pointer_down(&PointerEvent::left(10.0, 10.0));
    canvas.pointer_move(&PointerEvent::left(50.0, 50.0));
    canvas.pointer_up(&PointerEvent::left(50.0, 50.0));

    let drawn = recorder.drawn.borrow();
    let (shape, continued) = &drawn[0];
    let shape = shape.as_ref().unwrap();
    assert_eq!(shape.shape_type, ShapeType::Rectangle);
    assert_eq!(shape.points, vec![0.0, 0.0, 40.0, 40.0]);
    assert!(!continued);
    assert_eq!(canvas.mode(), Mode::Idle);
}

#[test]
fn brush_stamp_then_empty_eraser_session() {
    let (recorder, mut canvas) = common::canvas(200.0, 200.0, 0.0);
    let brush = BrushTool { size: 10.0, ..BrushTool::default() };
    canvas.draw(DrawData { brush_tool: Some(brush), ..DrawData::shape(ShapeType::Mask) }).unwrap();
    canvas.pointer_down(&PointerEvent::left(100.0, 100.0));
    canvas.pointer_up(&PointerEvent::left(100.0, 100.0));
    canvas.draw(DrawData::default()).unwrap();

    {
        let drawn = recorder.drawn.borrow();
        let shape = drawn[0].0.as_ref().unwrap();
        assert_eq!(shape.shape_type, ShapeType::Mask);
        let mask = RleMask::from_points(&shape.points).unwrap();
        let area = std::f64::consts::PI * 25.0;
        assert!((mask.foreground_pixels() as f64 - area).abs() <= 10.0);
    }

    let eraser = BrushTool { tool_type: BrushToolType::Eraser, ..BrushTool::default() };
    canvas.draw(DrawData { brush_tool: Some(eraser), ..DrawData::shape(ShapeType::Mask) }).unwrap();
    assert!(canvas.tools_blocker_state().eraser);
    canvas.draw(DrawData::default()).unwrap();
    assert_eq!(recorder.drawn.borrow().len(), 2);
    assert!(recorder.drawn.borrow()[1].0.is_none());
}

fn hexagon() -> Vec<f64> {
    (0..6)
        .flat_map(|i| {
            let a = (i as f64 * 60.0).to_radians();
            [100.0 + 40.0 * a.cos(), 100.0 + 40.0 * a.sin()]
        })
        .collect()
}

fn edit_hexagon(choice: usize) -> Vec<f64> {
    let (recorder, mut canvas) = common::canvas(200.0, 200.0, 0.0);
    canvas.configurate(Configuration { intelligent_polygon_crop: false, ..Configuration::default() });
    let state = ObjectState::new(ShapeType::Polygon, hexagon()).with_client_id(1);
    canvas.edit(EditData { enabled: true, state: Some(state), point_id: Some(0), ..EditData::default() }).unwrap();
    canvas.pointer_down(&PointerEvent::left(100.0, 100.0));
    canvas.pointer_down(&PointerEvent::left(60.0, 100.0));

    let candidates = canvas.preview().candidates;
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.len() >= 3));
    assert!(recorder.edited.borrow().is_empty());

    assert!(canvas.choose_candidate(choice));
    assert_eq!(canvas.mode(), Mode::Idle);
    let points = recorder.edited.borrow()[0].clone();
    points.unwrap()
}

#[test]
fn hexagon_split_offers_two_choices() {
    let first = edit_hexagon(0);
    let second = edit_hexagon(1);
    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 10);
    assert_ne!(first, second);
    assert_eq!(&first[..4], &[140.0, 100.0, 100.0, 100.0]);
}

#[test]
fn polyline_extension_from_the_last_vertex() {
    let (recorder, mut canvas) = common::canvas(200.0, 200.0, 0.0);
    let state = ObjectState::new(ShapeType::Polyline, vec![10.0, 10.0, 50.0, 10.0]);
    canvas.edit(EditData { enabled: true, state: Some(state), point_id: Some(1), ..EditData::default() }).unwrap();
    canvas.pointer_down(&PointerEvent::left(90.0, 40.0));
    canvas.edit(EditData::default()).unwrap();
    assert_eq!(recorder.edited.borrow()[0], Some(vec![10.0, 10.0, 50.0, 10.0, 90.0, 40.0]));
}

#[test]
fn square_sliced_in_half() {
    let (recorder, mut canvas) = common::canvas(200.0, 200.0, 0.0);
    let square = ObjectState::new(ShapeType::Polygon, vec![20.0, 20.0, 80.0, 20.0, 80.0, 80.0, 20.0, 80.0]);
    canvas.slice(SliceData { enabled: true, client_id: Some(4), state: Some(square) }).unwrap();
    canvas.pointer_down(&PointerEvent::left(50.0, 0.0));
    canvas.pointer_down(&PointerEvent::left(50.0, 50.0));
    assert!(recorder.sliced.borrow().is_empty());
    canvas.pointer_down(&PointerEvent::left(50.0, 100.0));

    let sliced = recorder.sliced.borrow();
    let [a, b] = sliced[0].clone().unwrap();
    assert_eq!(a, vec![50.0, 20.0, 50.0, 50.0, 50.0, 80.0, 20.0, 80.0, 20.0, 20.0]);
    assert_eq!(b, vec![50.0, 80.0, 50.0, 50.0, 50.0, 20.0, 80.0, 20.0, 80.0, 80.0]);
}

#[test]
fn mask_is_sliced_through_the_host_contour() {
    let (recorder, mut canvas) = common::canvas(40.0, 40.0, 0.0);
    // solid 10x10 block with its top-left pixel at (10, 10)
    let mask = ObjectState::new(ShapeType::Mask, vec![0.0, 100.0, 10.0, 10.0, 19.0, 19.0]);
    canvas.slice(SliceData { enabled: true, client_id: None, state: Some(mask) }).unwrap();
    assert!(!canvas.contour_ready(99, vec![]));
    let contour = vec![
        kurbo::Point::new(10.0, 10.0),
        kurbo::Point::new(20.0, 10.0),
        kurbo::Point::new(20.0, 20.0),
        kurbo::Point::new(10.0, 20.0),
    ];
    assert!(canvas.contour_ready(1, contour));
    canvas.pointer_down(&PointerEvent::left(15.0, 0.0));
    canvas.pointer_down(&PointerEvent::left(15.0, 15.0));
    canvas.pointer_down(&PointerEvent::left(15.0, 30.0));

    let sliced = recorder.sliced.borrow();
    let [a, b] = sliced[0].clone().unwrap();
    let (a, b) = (RleMask::from_points(&a).unwrap(), RleMask::from_points(&b).unwrap());
    assert_eq!(a.foreground_pixels(), 50);
    assert_eq!(b.foreground_pixels(), 50);
    assert_eq!((a.left, a.right), (10, 14));
    assert_eq!((b.left, b.right), (15, 19));
}
