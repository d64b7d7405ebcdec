//! Built-in scripts

use glam::{Vec2, Vec3};

use super::{PlaneRef, Script, Step};
use crate::feature::{BooleanOp, EdgeSelection, ExtrudeDirection, ProfileSelection};

/// Names of the built-in scripts
pub const BUILTIN_NAMES: &[&str] = &[
    "box",
    "rectangle-with-hole-and-fillet",
    "circle-with-hole-and-fillet",
    "face-with-eyes-and-mouth",
    "smiley-face",
];

/// Look up a built-in script by name
pub fn builtin(name: &str) -> Option<Script> {
    match name {
        "box" => Some(rectangle_with_hole_and_fillet("box")),
        "rectangle-with-hole-and-fillet" => {
            Some(rectangle_with_hole_and_fillet("rectangle-with-hole-and-fillet"))
        }
        "circle-with-hole-and-fillet" => Some(circle_with_hole_and_fillet()),
        "face-with-eyes-and-mouth" => Some(face_with_eyes_and_mouth()),
        "smiley-face" => Some(smiley_face()),
        _ => None,
    }
}

/// All built-in scripts
pub fn builtins() -> Vec<Script> {
    BUILTIN_NAMES.iter().filter_map(|name| builtin(name)).collect()
}

fn sketch(name: &str, plane: PlaneRef) -> Step {
    Step::Sketch {
        name: name.to_string(),
        plane,
    }
}

fn circle(x: f32, y: f32, radius: f32) -> Step {
    Step::Circle {
        center: Vec2::new(x, y),
        radius,
    }
}

fn new_body(name: &str, distance: f32) -> Step {
    Step::Extrude {
        name: name.to_string(),
        profiles: ProfileSelection::First,
        distance,
        direction: ExtrudeDirection::Positive,
        operation: BooleanOp::New,
        target: None,
    }
}

fn fillet_all(radius: f32) -> Step {
    Step::Fillet {
        name: "Fillet".to_string(),
        body: None,
        radius,
        edges: EdgeSelection::All,
    }
}

/// 20 x 10 plate with a r3 hole, 5 high, every edge rounded by 1
fn rectangle_with_hole_and_fillet(name: &str) -> Script {
    Script {
        name: name.to_string(),
        description: "Rectangle 20x10 with a 3 mm hole, extruded 5 mm, 1 mm fillet on all edges"
            .to_string(),
        success_message: "Rectangle with hole and fillets created successfully".to_string(),
        steps: vec![
            sketch("Sketch1", PlaneRef::Xy),
            Step::TwoPointRectangle {
                corner1: Vec2::new(-10.0, -5.0),
                corner2: Vec2::new(10.0, 5.0),
            },
            circle(0.0, 0.0, 3.0),
            new_body("Plate", 5.0),
            fillet_all(1.0),
        ],
    }
}

/// Ring of radii 25 and 20, 10 high, every edge rounded by 2
fn circle_with_hole_and_fillet() -> Script {
    Script {
        name: "circle-with-hole-and-fillet".to_string(),
        description: "Circle of 50 mm diameter with a 20 mm radius hole, extruded 10 mm, 2 mm fillet on all edges"
            .to_string(),
        success_message: "Circle with hole and fillets created successfully".to_string(),
        steps: vec![
            sketch("Sketch1", PlaneRef::Xy),
            circle(0.0, 0.0, 25.0),
            circle(0.0, 0.0, 20.0),
            new_body("Ring", 10.0),
            fillet_all(2.0),
        ],
    }
}

/// Disk of radius 50 with eye and mouth holes, 10 high, every edge rounded by 1.5
fn face_with_eyes_and_mouth() -> Script {
    Script {
        name: "face-with-eyes-and-mouth".to_string(),
        description: "Face disk with two eye holes and a mouth hole, extruded 10 mm, 1.5 mm fillet on all edges"
            .to_string(),
        success_message: "3D Smiley Face created successfully".to_string(),
        steps: vec![
            sketch("Sketch1", PlaneRef::Xy),
            circle(0.0, 0.0, 50.0),
            circle(-15.0, 15.0, 2.5),
            circle(15.0, 15.0, 2.5),
            circle(0.0, -10.0, 10.0),
            new_body("Face", 10.0),
            fillet_all(1.5),
        ],
    }
}

/// Disk of radius 25, 5 high, with eyes and a smile pocketed 3 deep into its top
fn smiley_face() -> Script {
    Script {
        name: "smiley-face".to_string(),
        description: "Disk of 50 mm diameter, 5 mm high, with eyes and smile cut 3 mm into the top face"
            .to_string(),
        success_message: "Smiley face created successfully".to_string(),
        steps: vec![
            sketch("Sketch1", PlaneRef::Xy),
            circle(0.0, 0.0, 25.0),
            new_body("Face", 5.0),
            sketch(
                "Top",
                PlaneRef::FaceWithNormal {
                    body: Some("Face".to_string()),
                    normal: Vec3::Z,
                },
            ),
            circle(-10.0, 10.0, 2.5),
            circle(10.0, 10.0, 2.5),
            circle(0.0, -10.0, 7.5),
            Step::Extrude {
                name: "Cut".to_string(),
                profiles: ProfileSelection::All,
                distance: 3.0,
                direction: ExtrudeDirection::Negative,
                operation: BooleanOp::Cut,
                target: Some("Face".to_string()),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        assert_eq!(builtins().len(), BUILTIN_NAMES.len());
        for script in builtins() {
            assert!(!script.steps.is_empty());
            assert!(matches!(script.steps[0], Step::Sketch { .. }));
        }
    }
}
