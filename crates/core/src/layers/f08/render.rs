//! Fortran declarations, statements and comments

use crate::types::{Binding, IgnoreHandling, Parameter, ProcedureDescriptor, Variable, names};

/// Type of choice buffer dummies, defined by the wrapper guard.
pub const CHOICE_BUFFER_TYPE: &str = "CHOICE_BUFFER_TYPE";

fn macro_name(prefix: &str, procedure: &ProcedureDescriptor) -> String {
    let mut name = format!("{prefix}{}", names::remove_postfix(&procedure.std_name).to_uppercase());
    if procedure.embiggened {
        name.push_str("_C");
    }
    name
}

/// Configure-time macro holding the subroutine name, defined only when the
/// library provides the procedure.
pub fn symbol_macro(procedure: &ProcedureDescriptor) -> String {
    macro_name("SCOREP_F08_SYMBOL_NAME_", procedure)
}

/// Configure-time macro telling whether assumed-rank buffers are supported.
pub fn choice_buffers_macro(procedure: &ProcedureDescriptor) -> String {
    macro_name("F08_TS_BUFFERS_", procedure)
}

/// The `HAVE(X)` test spelled out for the Fortran preprocessor.
pub fn have(name: &str) -> String {
    format!("( defined( HAVE_{name} ) && HAVE_{name} )")
}

/// Event generation check for a measurement group, e.g. `XREQTEST`.
pub fn event_gen_on_for(group: &str) -> String {
    format!(
        "(logical(scorep_mpi_is_event_gen_on()) .and. (iand(scorep_mpi_enabled, SCOREP_MPI_ENABLED_{}) .gt. 0))",
        group.to_uppercase()
    )
}

/// Type declaration statement: `integer, DIMENSION(*), INTENT(IN) :: name`.
pub fn declaration(binding: &Binding, intent: Option<&str>) -> String {
    let mut decl = binding.ty.clone();
    if !binding.dims.is_empty() {
        decl.push_str(&format!(", DIMENSION({})", binding.dims.join(",")));
    }
    if let Some(intent) = intent {
        decl.push_str(&format!(", INTENT({intent})"));
    }
    for attribute in &binding.attributes {
        decl.push_str(", ");
        decl.push_str(attribute);
    }
    format!("{decl} :: {}", binding.name)
}

/// Declaration of a dummy argument as seen by the caller.
///
/// Choice buffers use [`CHOICE_BUFFER_TYPE`], which carries its own rank.
/// Statuses that may be substituted must be `TARGET` so the internal
/// pointer can alias them.
pub fn dummy_declaration(parameter: &Parameter) -> String {
    let mut binding = parameter.binding.clone();
    if parameter.buffer {
        binding.ty = CHOICE_BUFFER_TYPE.to_string();
        binding.dims.clear();
    } else if parameter.ignore_handling != IgnoreHandling::None && !binding.has_attribute("TARGET") {
        binding.attributes.push("TARGET".to_string());
    }
    declaration(&binding, Some(parameter.direction.intent()))
}

/// Declaration of the local standing in for a dummy argument.
pub fn internal_declaration(parameter: &Parameter) -> String {
    declaration(&parameter.internal_binding(), None)
}

pub fn variable_declaration(variable: &Variable) -> String {
    declaration(&variable.binding, None)
}

/// Assignment of a local's initializer. Fortran initializers in
/// declarations imply `SAVE`, so they are assigned in the body instead.
pub fn variable_initialization(variable: &Variable) -> Option<String> {
    variable
        .initializer
        .as_ref()
        .filter(|init| !init.is_empty())
        .map(|init| format!("{} = {init}", variable.name()))
}

/// Points the internal status at scratch storage when the caller passed the
/// "ignore" sentinel, or at the caller's status otherwise.
pub fn status_ignore_init(parameter: &Parameter) -> Option<String> {
    let name = parameter.name();
    let internal = parameter.internal_name();
    match &parameter.ignore_handling {
        IgnoreHandling::None => None,
        IgnoreHandling::Status => Some(format!(
            "if ( scorep_mpi_is_status_ignore({name}) ) then\n\
             \x20   call c_f_pointer( scorep_mpi_get_status_array(1_c_size_t), {internal} )\n\
             else\n\
             \x20   {internal} => {name}\n\
             end if\n"
        )),
        IgnoreHandling::Statuses { length } => Some(format!(
            "if ( scorep_mpi_is_statuses_ignore({name}) ) then\n\
             \x20   call c_f_pointer( scorep_mpi_get_status_array(int({length},c_size_t)), &\n\
             \x20                    {internal}, &\n\
             \x20                    shape=[{length}] )\n\
             else\n\
             \x20   {internal} => {name}(:{length})\n\
             end if\n"
        )),
    }
}

/// Copy-back of an optional output argument.
pub fn optional_out_cleanup(parameter: &Parameter) -> Option<String> {
    if !parameter.is_optional_out() {
        return None;
    }
    let name = parameter.name();
    Some(format!(
        "if (present({name})) then\n    {name} = {}\nend if\n",
        parameter.internal_name()
    ))
}

/// Prints the message and stops the program.
pub fn fatal(message: &str) -> String {
    format!("print *, \"[Score-P] Fatal: \", &\n \"{message}\"\nERROR STOP\n")
}

pub fn warning(message: &str) -> String {
    format!("print *, \"[Score-P] Warning: \", &\n \"{message}\"\n")
}

/// Measurement phase test, `phase` being `PRE`, `WITHIN` or `POST`.
pub fn measurement_phase(phase: &str) -> String {
    format!("(logical(scorep_is_measurement_phase(SCOREP_MEASUREMENT_PHASE_{phase}_C)))")
}

/// Comment with one `! ` line per input line.
pub fn comment_block(text: &str) -> String {
    text.lines().map(|line| format!("! {line}\n")).collect()
}

/// Hook trace formatter.
pub fn debug_comment(message: &str) -> String {
    format!("! {} \n", message.replace('\n', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Version};

    #[test]
    fn test_macros() {
        let p = ProcedureDescriptor::new("MPI_Send_c", Version::new(4, 0)).embiggened();
        assert_eq!(symbol_macro(&p), "SCOREP_F08_SYMBOL_NAME_MPI_SEND_C");
        assert_eq!(choice_buffers_macro(&p), "F08_TS_BUFFERS_MPI_SEND_C");
        assert_eq!(have("X"), "( defined( HAVE_X ) && HAVE_X )");
    }

    fn status() -> Parameter {
        let mut p = Parameter::new(Binding::new("status", "TYPE(MPI_Status)"));
        p.direction = Direction::Out;
        p.internal_replacement = true;
        p.ignore_handling = IgnoreHandling::Status;
        p
    }

    #[test]
    fn test_declaration() {
        let b = Binding::new("array_of_requests", "TYPE(MPI_Request)")
            .with_dim("count")
            .with_attribute("ASYNCHRONOUS");
        assert_eq!(
            declaration(&b, Some("INOUT")),
            "TYPE(MPI_Request), DIMENSION(count), INTENT(INOUT), ASYNCHRONOUS :: array_of_requests"
        );
        let b = Binding::new("regionHandle", "integer(kind=SCOREP_InterimCommunicatorHandle)");
        assert_eq!(
            declaration(&b, None),
            "integer(kind=SCOREP_InterimCommunicatorHandle) :: regionHandle"
        );
    }

    #[test]
    fn test_dummy_declarations() {
        let mut buf = Parameter::new(Binding::new("buf", "TYPE(*)").with_dim("..").with_attribute("ASYNCHRONOUS"));
        buf.buffer = true;
        assert_eq!(
            dummy_declaration(&buf),
            "CHOICE_BUFFER_TYPE, INTENT(IN), ASYNCHRONOUS :: buf"
        );
        assert_eq!(
            dummy_declaration(&status()),
            "TYPE(MPI_Status), INTENT(OUT), TARGET :: status"
        );
        assert_eq!(
            internal_declaration(&status()),
            "TYPE(MPI_Status), POINTER :: internal_status"
        );
    }

    #[test]
    fn test_status_init() {
        let init = status_ignore_init(&status()).unwrap();
        assert!(init.starts_with("if ( scorep_mpi_is_status_ignore(status) ) then\n"));
        assert!(init.contains("    internal_status => status\n"));

        let mut statuses = status();
        statuses.binding.name = "array_of_statuses".to_string();
        statuses.binding.dims = vec!["*".to_string()];
        statuses.ignore_handling = IgnoreHandling::Statuses {
            length: "count".to_string(),
        };
        let init = status_ignore_init(&statuses).unwrap();
        assert!(init.contains("scorep_mpi_get_status_array(int(count,c_size_t)), &\n"));
        assert!(init.contains("                     shape=[count] )\n"));
        assert!(init.contains("internal_array_of_statuses => array_of_statuses(:count)\n"));
    }

    #[test]
    fn test_optional_out_cleanup() {
        let mut ierror = Parameter::new(Binding::new("ierror", "INTEGER").with_attribute("OPTIONAL"));
        ierror.direction = Direction::Out;
        ierror.internal_replacement = true;
        assert_eq!(
            optional_out_cleanup(&ierror).unwrap(),
            "if (present(ierror)) then\n    ierror = internal_ierror\nend if\n"
        );
        assert!(optional_out_cleanup(&status()).is_none());
    }

    #[test]
    fn test_initialization_and_comments() {
        let v = Variable::initialized(Binding::new("local_i", "integer"), "0");
        assert_eq!(variable_initialization(&v).as_deref(), Some("local_i = 0"));
        assert!(variable_initialization(&Variable::new(Binding::new("x", "integer"))).is_none());
        assert_eq!(comment_block("a\nb"), "! a\n! b\n");
        assert_eq!(debug_comment("Hook 'use' enter\n"), "! Hook 'use' enter \n");
        assert_eq!(
            fatal("no"),
            "print *, \"[Score-P] Fatal: \", &\n \"no\"\nERROR STOP\n"
        );
    }
}
