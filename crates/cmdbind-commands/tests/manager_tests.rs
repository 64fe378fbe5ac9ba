use std::any::Any;
use std::sync::{Arc, Mutex};

use cmdbind_commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl CommandEnum for Color {
        const TYPE_NAME: &'static str = "color";

        fn variants() -> &'static [Self] {
            &[Color::Red, Color::Green, Color::Blue]
        }

        fn constant(&self) -> &'static str {
            match self {
                Color::Red => "RED",
                Color::Green => "GREEN",
                Color::Blue => "BLUE",
            }
        }
    }

    struct Guest {
        inbox: Mutex<Vec<String>>,
    }

    impl CommandSender for Guest {
        fn name(&self) -> &str {
            "guest"
        }

        fn sender_type(&self) -> SenderType {
            SenderType::new("console")
        }

        fn send_message(&self, message: &str) {
            self.inbox.lock().unwrap().push(message.to_string());
        }

        fn has_permission(&self, _permission: &str) -> bool {
            false
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn console() -> Arc<dyn CommandSender> {
        Arc::new(ConsoleSender::new("console"))
    }

    fn create_test_manager() -> CommandManager {
        let mut manager = CommandManager::default();
        manager.types_mut().register_enum::<Color>();

        let string = manager.types().get(ParameterTypes::STRING).unwrap();
        let integer = manager.types().get(ParameterTypes::INTEGER).unwrap();
        let color = manager.types().get("color").unwrap();

        manager
            .register_command(
                Command::new("greet")
                    .with_summary("Greet someone")
                    .with_parameter(CommandParameter::new("name", string.clone()))
                    .unwrap(),
            )
            .unwrap();
        manager
            .register_command(
                Command::new("math sum")
                    .with_parameter(CommandParameter::new("numbers", integer.clone()).with_form(Form::List))
                    .unwrap()
                    .with_parameter(CommandParameter::new("label", string.clone()))
                    .unwrap(),
            )
            .unwrap();
        manager
            .register_command(
                Command::new("paint")
                    .with_parameter(CommandParameter::new("color", color))
                    .unwrap()
                    .with_parameter(CommandParameter::new("times", integer).with_default("1"))
                    .unwrap(),
            )
            .unwrap();
        manager
            .register_command(
                Command::new("admin ban")
                    .with_permission("admin.ban")
                    .with_parameter(CommandParameter::new("target", string))
                    .unwrap(),
            )
            .unwrap();
        manager
    }

    #[test]
    fn test_list_commands() {
        let manager = create_test_manager();
        let names: Vec<String> = manager
            .list_commands()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["help", "greet", "math sum", "paint", "admin ban"]);
    }

    #[test]
    fn test_one_required_parameter_boundary() {
        let manager = create_test_manager();
        assert_eq!(
            manager
                .dispatch(&console(), "greet", &RawArguments::new())
                .unwrap_err(),
            CommandError::TooFewArguments(Some("name".to_string()))
        );
        assert_eq!(
            manager
                .dispatch(&console(), "greet", &RawArguments::positional(["a", "b"]))
                .unwrap_err(),
            CommandError::TooManyArguments(Some("b".to_string()))
        );
    }

    #[test]
    fn test_vararg_hands_rejected_token_to_next_parameter() {
        let manager = create_test_manager();
        let invocation = manager
            .dispatch(&console(), "math sum", &RawArguments::positional(["1", "2", "x"]))
            .unwrap();
        assert_eq!(
            invocation.bindings.get_as::<Vec<i64>>("numbers"),
            Some(vec![1, 2])
        );
        assert_eq!(invocation.bindings.get_as::<String>("label"), Some("x".to_string()));
    }

    #[test]
    fn test_lone_vararg_binds_empty_and_rejects_leftover() {
        let mut manager = CommandManager::default();
        let integer = manager.types().get(ParameterTypes::INTEGER).unwrap();
        manager
            .register_command(
                Command::new("sum")
                    .with_parameter(CommandParameter::new("numbers", integer).with_form(Form::List))
                    .unwrap(),
            )
            .unwrap();

        let invocation = manager.dispatch(&console(), "sum", &RawArguments::new()).unwrap();
        assert_eq!(invocation.bindings.get_as::<Vec<i64>>("numbers"), Some(vec![]));
        assert_eq!(
            manager.dispatch(&console(), "sum x", &RawArguments::new()).unwrap_err(),
            CommandError::TooManyArguments(Some("x".to_string()))
        );
    }

    #[test]
    fn test_enum_conversion_ignores_case() {
        let manager = create_test_manager();
        let invocation = manager
            .dispatch(&console(), "paint", &RawArguments::positional(["green"]))
            .unwrap();
        assert_eq!(invocation.bindings.get_enum::<Color>("color"), Some(Color::Green));
        assert_eq!(invocation.bindings.get_as::<i64>("times"), Some(1));

        let values = manager.types().get("color").unwrap().values().unwrap();
        assert_eq!(values, vec!["RED", "GREEN", "BLUE"]);
    }

    #[test]
    fn test_permission_checked_before_arguments() {
        let manager = create_test_manager();
        let guest: Arc<dyn CommandSender> = Arc::new(Guest {
            inbox: Mutex::new(Vec::new()),
        });
        let raw = RawArguments::positional(["a", "b", "c"]).with_named("bogus", "1");
        assert_eq!(
            manager.dispatch(&guest, "admin ban", &raw).unwrap_err(),
            CommandError::PermissionDenied(Some("admin.ban".to_string()))
        );
    }

    #[test]
    fn test_permission_denied_is_sent_to_sender() {
        let manager = create_test_manager();
        let guest = Arc::new(Guest {
            inbox: Mutex::new(Vec::new()),
        });
        let sender: Arc<dyn CommandSender> = guest.clone();

        let response = manager.execute(&sender, "admin ban", &RawArguments::positional(["bob"]));
        assert_eq!(response.error.as_ref().unwrap().code, ErrorCode::PermissionDenied);
        assert_eq!(
            *guest.inbox.lock().unwrap(),
            vec!["Permission denied: admin.ban".to_string()]
        );
    }

    #[test]
    fn test_incomplete_and_unknown_paths() {
        let manager = create_test_manager();
        assert_eq!(
            manager.dispatch(&console(), "admin", &RawArguments::new()).unwrap_err(),
            CommandError::IncompleteCommand(Some("admin".to_string()))
        );
        assert_eq!(
            manager.dispatch(&console(), "launch", &RawArguments::new()).unwrap_err(),
            CommandError::NotACommand(Some("launch".to_string()))
        );
    }

    #[test]
    fn test_path_lookup_ignores_case_but_arguments_keep_it() {
        let manager = create_test_manager();
        let invocation = manager
            .dispatch(&console(), "GREET Alice", &RawArguments::new())
            .unwrap();
        assert_eq!(invocation.command.name(), "greet");
        assert_eq!(invocation.bindings.get_as::<String>("name"), Some("Alice".to_string()));
    }

    #[test]
    fn test_help_lists_usage() {
        let manager = create_test_manager();
        let response = manager.execute(&console(), "help", &RawArguments::new());
        let lines: Vec<String> = response
            .body
            .as_ref()
            .and_then(Value::as_slice)
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(lines[0], "help - Displays a list of available commands");
        assert_eq!(lines[1], "greet <name> - Greet someone");
        assert_eq!(lines[2], "math sum <numbers...> <label>");
        assert_eq!(lines[3], "paint <color> [times=1]");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("engine.yml");
        std::fs::write(&path, "separator: \"/\"\nregister_help: false\n").unwrap();

        let mut manager = CommandManager::from_file(&path).unwrap();
        assert!(manager.list_commands().is_empty());
        manager.register_command(Command::new("server/stop")).unwrap();
        assert!(manager.get_command("server/stop").is_some());
        assert!(manager.get_command("server stop").is_none());
    }
}
