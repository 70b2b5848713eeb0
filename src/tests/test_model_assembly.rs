mod test_model_assembly {
    use crate::assemble_project;
    use crate::core::analytic::{shade, temp_ground_striped};
    use crate::core::geometry::{row_pitch, BoundaryId, GeometryFeature, Handle};
    use crate::core::model::{assemble_model, ModelInputs};
    use crate::core::physics::HeatTransferFeature;
    use crate::core::units::Tilt;
    use crate::errors::{InputError, ModelError, PvthermError};
    use crate::input::{InputPaths, ModuleProperties, RunConfig};
    use crate::read_met_file::met_history_from_reader;
    use crate::tests::project_dir;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn inputs(module: &ModuleProperties, tilt: f64) -> ModelInputs {
        let tilt = Tilt::new(tilt).unwrap();

        ModelInputs {
            parameters: module.parameter_table(tilt, &[]).unwrap(),
            array: module.array_geometry(tilt),
            met_history: PathBuf::from("TOMCAT_input.csv"),
        }
    }

    #[rstest]
    #[case(0.)]
    #[case(20.)]
    #[case(40.)]
    #[case(60.)]
    #[case(85.)]
    fn test_model_assembles_across_tilts(#[case] tilt: f64) {
        let model = assemble_model(&inputs(&ModuleProperties::default(), tilt)).unwrap();

        assert_eq!(
            model.parameters.get("tilt").unwrap().expression,
            format!("{tilt}[deg]")
        );
        assert_eq!(
            model
                .geometry
                .features()
                .iter()
                .map(GeometryFeature::label)
                .collect::<Vec<_>>(),
            vec![
                "module laminate",
                "ground",
                "back of previous row",
                "front of previous row",
                "back of next row",
                "front of next row"
            ]
        );
    }

    #[rstest]
    fn test_native_row_pitch_matches_parameter() {
        let inputs = inputs(&ModuleProperties::default(), 20.);

        assert_eq!(
            inputs.parameters.get("rowPitch").unwrap().expression,
            "2*hModule*cos(tilt)"
        );
        assert_relative_eq!(inputs.array.row_pitch, 1.879, epsilon = 1e-3);
        assert_relative_eq!(
            inputs.array.row_pitch,
            row_pitch(1., Tilt::new(20.).unwrap()),
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_oversized_module_is_rejected() {
        let module = ModuleProperties {
            h_module: 5.,
            ..Default::default()
        };

        assert!(matches!(
            assemble_model(&inputs(&module, 20.)),
            Err(ModelError::RowsBeyondGround { .. })
        ));
    }

    #[rstest]
    fn test_rear_irradiance_lands_on_module_back() {
        let model = assemble_model(&inputs(&ModuleProperties::default(), 40.)).unwrap();

        let rear = model
            .physics
            .heat_transfer
            .features
            .iter()
            .find_map(|feature| match feature {
                HeatTransferFeature::HeatFlux {
                    label,
                    selection,
                    q0,
                } if label == "incident rear irradiance" => Some((selection.clone(), q0.clone())),
                _ => None,
            })
            .unwrap();

        assert_eq!(rear.0, vec![BoundaryId::ModuleBack]);
        assert_eq!(rear.1, "irradBackFraction*poai(t*1[1/s])*absBackSheet");
        assert!(model
            .geometry
            .resolve(Handle::Boundary(BoundaryId::ModuleBack))
            .is_some());
    }

    #[rstest]
    fn test_ground_is_air_temperature_at_night() {
        let csv = [
            "elapsed,temp,temp_sky,temp_ground,poai,dni,wind_speed,elevation_projected,\
             abs_glass,abs_encapsulant,abs_cell,current_factor",
            "0,283.15,260,290,0,0,1,0,0,0,0,1",
            "3600,281.15,258,289,0,0,1,0,0,0,0,1",
        ]
        .join("\n");
        let met = met_history_from_reader(Cursor::new(csv)).unwrap();
        let geometry = ModuleProperties::default().array_geometry(Tilt::new(30.).unwrap());

        for i in 0..40 {
            let x = -10. + 0.5 * i as f64;
            assert!(shade(&geometry, &met, x, 1800.));
            assert_relative_eq!(
                temp_ground_striped(&geometry, &met, x, 1800.),
                282.15,
                epsilon = 1e-9
            );
        }
    }

    #[rstest]
    fn test_missing_tilt_file_stops_assembly() {
        let dir = project_dir("no-tilt", "20", 2);
        std::fs::remove_file(dir.join("TOMCAT_tilt.txt")).unwrap();

        let error = assemble_project(&InputPaths::in_directory(&dir), &RunConfig::default())
            .unwrap_err();

        assert!(matches!(
            error,
            PvthermError::InvalidInput(InputError::TiltFileUnreadable { .. })
        ));
        assert!(error.to_string().contains("TOMCAT_tilt.txt"));
    }

    #[rstest]
    fn test_project_assembles_from_files() {
        let dir = project_dir("assemble", "25\n", 3);

        let (model, met) =
            assemble_project(&InputPaths::in_directory(&dir), &RunConfig::default()).unwrap();

        assert_eq!(met.len(), 4);
        assert_eq!(model.parameters.get("tilt").unwrap().expression, "25[deg]");
        assert_eq!(
            model.functions.interpolation.source,
            dir.join("TOMCAT_input.csv")
        );
    }
}
