use tracing::warn;

use super::hooks::CHook;
use super::{render, tasks};
use crate::error::{Error, Result};
use crate::hooks::{Fragments, HookComposer};
use crate::layers::{BindingLayer, Template, WrapperOptions};
use crate::registry::TaskRegistry;
use crate::task::TaskRef;
use crate::types::{Binding, Layer, ProcedureDescriptor, Scope, Variable, names};
use crate::wrapper::Wrapper;

/// Measurement wrapper of one procedure in the C bindings.
#[derive(Debug)]
pub struct CWrapper {
    inner: Wrapper<CHook>,
    template: Template,
    guards: Vec<String>,
    group: String,
}

impl CWrapper {
    pub fn new(procedure: ProcedureDescriptor, options: &WrapperOptions) -> Result<Self> {
        if options.template == Template::ProtoArgsWrapper && options.c_variants.is_empty() {
            let message = format!(
                "The wrapper for {} uses the 'ProtoArgsWrapper' template, but no prototype variants are defined via 'c_variants'",
                procedure.canonical_name
            );
            if options.strict {
                return Err(Error::Template(message));
            }
            warn!("{}", message);
        }

        let locals = Self::wrapper_locals(&procedure, &options.group)?;
        let mut inner = Wrapper::new(procedure, locals);
        if options.debug {
            inner.set_debug_formatter(render::debug_comment);
        }
        Ok(Self {
            inner,
            template: options.template,
            guards: options.guards.clone(),
            group: options.group.clone(),
        })
    }

    fn wrapper_locals(procedure: &ProcedureDescriptor, group: &str) -> Result<Scope<Variable>> {
        let return_type = procedure.return_type.as_deref().ok_or_else(|| {
            Error::Template(format!(
                "Function without return type in {}: {}",
                procedure.canonical_name, procedure.std_name
            ))
        })?;
        Ok(Scope::from_named([
            Variable::new(Binding::new("return_value", return_type)),
            Variable::initialized(
                Binding::new("regionHandle", "int").constant(),
                format!(
                    "scorep_mpi_regions[ SCOREP_MPI_REGION__{} ]",
                    procedure.canonical_name.to_uppercase()
                ),
            ),
            Variable::initialized(
                Binding::new("event_gen_active", "int"),
                "SCOREP_MPI_IS_EVENT_GEN_ON",
            ),
            Variable::initialized(
                Binding::new("event_gen_active_for_group", "int").constant(),
                format!(
                    "SCOREP_MPI_IS_EVENT_GEN_ON_FOR( SCOREP_MPI_ENABLED_{} )",
                    group.to_uppercase()
                ),
            ),
        ]))
    }

    fn procedure(&self) -> &ProcedureDescriptor {
        self.inner.procedure()
    }

    fn generate_wrapper(&self) -> Result<Fragments> {
        let composer = self.inner.composer();
        let mut out = Fragments::new();

        self.guard_start(&mut out);
        self.pmpi_declaration(&mut out);
        composer.compose_with_post(
            CHook::Comment,
            &mut out,
            |out| {
                self.comment(out);
                Ok(())
            },
            Some(|out: &mut Fragments| {
                out.push("*/\n");
                Ok(())
            }),
        )?;
        self.procedure_start(&mut out);
        out.push("SCOREP_IN_MEASUREMENT_INCREMENT();\n");
        self.internal_declarations(&mut out);
        self.local_declarations(&mut out);
        composer.compose(CHook::Initialization, &mut out, |out| {
            self.initialization(out);
            Ok(())
        })?;
        composer.compose(CHook::Body, &mut out, |out| self.body(&composer, out))?;
        composer.compose(CHook::Cleanup, &mut out, |_| Ok(()))?;
        out.push("SCOREP_IN_MEASUREMENT_DECREMENT();\n");
        out.push("return return_value;\n");
        out.push("}\n");
        self.guard_end(&mut out);
        out.push("\n");
        Ok(out)
    }

    fn proto_args(&self) -> String {
        format!("SCOREP_{}_PROTO_ARGS", self.procedure().std_name.to_uppercase())
    }

    fn return_type(&self) -> &str {
        self.procedure().return_type.as_deref().unwrap_or("int")
    }

    fn guard_start(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        match self.template {
            Template::GuardComplianceWrapper => out.push(format!(
                "#if HAVE( {}_COMPLIANT )\n",
                procedure.std_name.to_uppercase()
            )),
            Template::ProtoArgsWrapper => out.push(format!("#if defined({})\n", self.proto_args())),
            _ => {}
        }
        out.push(format!(
            "#if HAVE( MPI_{}_{}_SYMBOL_PMPI_{} )",
            procedure.version.major,
            procedure.version.minor,
            names::remove_prefix(&procedure.std_name).to_uppercase()
        ));
        for guard in &self.guards {
            out.push(format!(" && !defined(SCOREP_MPI_NO_{})", guard.to_uppercase()));
        }
        out.push(format!(" && !defined({})\n", procedure.std_name));
    }

    fn guard_end(&self, out: &mut Fragments) {
        out.push("#endif\n");
        if matches!(
            self.template,
            Template::GuardComplianceWrapper | Template::ProtoArgsWrapper
        ) {
            out.push("#endif\n");
        }
    }

    fn prototype(&self, prefix: &str) -> String {
        let procedure = self.procedure();
        format!(
            "{} {prefix}{}({})",
            self.return_type(),
            procedure.std_name,
            render::parameter_list(&procedure.parameters)
        )
    }

    fn pmpi_declaration(&self, out: &mut Fragments) {
        if self.template == Template::ProtoArgsWrapper {
            out.push(format!(
                "{} P{} {};\n",
                self.return_type(),
                self.procedure().std_name,
                self.proto_args()
            ));
        } else {
            out.push(self.prototype("P"));
            out.push(";\n");
        }
    }

    fn procedure_start(&self, out: &mut Fragments) {
        if self.template == Template::ProtoArgsWrapper {
            out.push(format!(
                "{} {} {}\n",
                self.return_type(),
                self.procedure().std_name,
                self.proto_args()
            ));
            out.push("{\n");
        } else {
            out.push(self.prototype(""));
            out.push(" {\n");
        }
    }

    fn comment(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        out.push(format!(
            "/**\n * Measurement wrapper for {} in the C bindings.\n * @note Introduced in MPI {}\n",
            procedure.std_name, procedure.version
        ));
        if procedure.embiggened {
            out.push("* @note Embiggened procedure\n");
        }
        out.push(format!("* @ingroup {}\n", self.group));
    }

    fn internal_declarations(&self, out: &mut Fragments) {
        out.push("/* Internal replacements for function arguments */\n");
        for parameter in self.procedure().internal_parameters() {
            out.push(format!("{};\n", render::declaration(&parameter.internal_binding())));
        }
    }

    fn local_declarations(&self, out: &mut Fragments) {
        out.push("/* Local variable declarations */\n");
        for local in self.inner.all_locals() {
            out.push(format!("{}\n", render::variable(local)));
        }
        out.push("\n");
    }

    fn initialization(&self, out: &mut Fragments) {
        for parameter in &self.procedure().parameters {
            if let Some(init) = render::status_ignore_init(parameter) {
                out.push(init);
            }
        }
    }

    fn body(&self, composer: &HookComposer<'_, CHook>, out: &mut Fragments) -> Result<()> {
        composer.compose(CHook::WrapperEnter, out, |out| self.wrapper_enter(composer, out))?;
        composer.compose(CHook::PrePmpiCall, out, |_| Ok(()))?;
        composer.compose(CHook::PmpiCall, out, |out| {
            self.pmpi_call(out);
            Ok(())
        })?;
        composer.compose(CHook::PostPmpiCall, out, |_| Ok(()))?;
        composer.compose(CHook::WrapperExit, out, |out| self.wrapper_exit(composer, out))
    }

    fn wrapper_enter(&self, composer: &HookComposer<'_, CHook>, out: &mut Fragments) -> Result<()> {
        out.push("if (event_gen_active) {\n");
        composer.compose(CHook::EnterIfActive, out, |_| Ok(()))?;
        out.push("SCOREP_MPI_EVENT_GEN_OFF();\nif (event_gen_active_for_group) {\n");
        composer.compose(CHook::EnterIfGroupActivePre, out, |_| Ok(()))?;
        out.push("SCOREP_EnterWrappedRegion(regionHandle);\n");
        composer.compose(CHook::EnterIfGroupActive, out, |_| Ok(()))?;
        out.push("} else if (SCOREP_IsUnwindingEnabled()) {\nSCOREP_EnterWrapper(regionHandle);\n");
        composer.compose(CHook::EnterIfUnwinding, out, |_| Ok(()))?;
        out.push("}\n}\n\n");
        Ok(())
    }

    fn pmpi_call(&self, out: &mut Fragments) {
        let procedure = self.procedure();
        if self.template == Template::FakeFinalizationWrapper {
            out.push("SCOREP_ENTER_WRAPPED_REGION();\n");
            out.push(render::comment_block("Fake finalization"));
            out.push(
                "return_value = PMPI_Barrier(MPI_COMM_WORLD);\n\
                 SCOREP_EXIT_WRAPPED_REGION();\n\
                 if (MPI_SUCCESS == return_value)\n\
                 {\n    mpi_finalize_called = true;\n}\n",
            );
            return;
        }
        let args: Vec<String> = procedure.parameters.iter().map(|p| p.internal_name()).collect();
        out.push(format!(
            "SCOREP_ENTER_WRAPPED_REGION();\nreturn_value = P{}( {} );\nSCOREP_EXIT_WRAPPED_REGION();\n\n",
            procedure.std_name,
            args.join(", ")
        ));
    }

    fn wrapper_exit(&self, composer: &HookComposer<'_, CHook>, out: &mut Fragments) -> Result<()> {
        out.push("if (event_gen_active) {\n");
        composer.compose(CHook::ExitIfActive, out, |_| Ok(()))?;
        out.push("if (event_gen_active_for_group) {\n");
        composer.compose(CHook::ExitIfGroupActive, out, |_| Ok(()))?;
        out.push("SCOREP_ExitRegion(regionHandle);\n} else if (SCOREP_IsUnwindingEnabled()) {\n");
        composer.compose(CHook::ExitIfUnwinding, out, |_| Ok(()))?;
        out.push("SCOREP_ExitWrapper(regionHandle);\n}\nSCOREP_MPI_EVENT_GEN_ON();\n}\n\n");
        Ok(())
    }
}

impl BindingLayer for CWrapper {
    type Hook = CHook;

    const LAYER: Layer = Layer::C;

    fn registry() -> &'static TaskRegistry<CHook> {
        tasks::registry()
    }

    fn todo_task() -> TaskRef<CHook> {
        &tasks::TaskTodo
    }

    fn new_wrapper(procedure: ProcedureDescriptor, options: &WrapperOptions) -> Result<Self> {
        Self::new(procedure, options)
    }

    fn wrapper(&self) -> &Wrapper<CHook> {
        &self.inner
    }

    fn wrapper_mut(&mut self) -> &mut Wrapper<CHook> {
        &mut self.inner
    }

    fn generate(&self) -> Result<Fragments> {
        self.generate_wrapper()
    }

    fn placeholder(name: &str, reason: &str) -> String {
        render::comment_block(&format!("WARNING: No wrapper generated for {name}: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Attributes;
    use crate::types::{Direction, IgnoreHandling, Parameter, Version};
    use serde_json::json;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter::new(Binding::new(name, ty))
    }

    fn mpi_send() -> ProcedureDescriptor {
        ProcedureDescriptor::new("MPI_Send", Version::new(1, 0))
            .with_return_type("int")
            .with_parameter(Parameter::new(Binding::new("buf", "void").with_pointer(1).constant()))
            .with_parameter(param("count", "int"))
            .with_parameter(param("datatype", "MPI_Datatype"))
            .with_parameter(param("dest", "int"))
            .with_parameter(param("tag", "int"))
            .with_parameter(param("comm", "MPI_Comm"))
    }

    fn mpi_recv() -> ProcedureDescriptor {
        let mut status = Parameter::new(Binding::new("status", "MPI_Status").with_pointer(1));
        status.direction = Direction::Out;
        status.ignore_handling = IgnoreHandling::Status;
        ProcedureDescriptor::new("MPI_Recv", Version::new(1, 0))
            .with_return_type("int")
            .with_parameter(Parameter::new(Binding::new("buf", "void").with_pointer(1)))
            .with_parameter(param("count", "int"))
            .with_parameter(param("datatype", "MPI_Datatype"))
            .with_parameter(param("source", "int"))
            .with_parameter(param("tag", "int"))
            .with_parameter(param("comm", "MPI_Comm"))
            .with_parameter(status)
    }

    fn options() -> WrapperOptions {
        WrapperOptions {
            group: "p2p".to_string(),
            ..Default::default()
        }
    }

    fn generate(wrapper: &CWrapper) -> String {
        wrapper.generate().unwrap().concat()
    }

    #[test]
    fn test_default_wrapper_skeleton() {
        let mut w = CWrapper::new(mpi_send(), &options()).unwrap();
        w.attach(&tasks::TaskDefault, Attributes::new()).unwrap();
        let code = generate(&w);

        assert!(code.starts_with(
            "#if HAVE( MPI_1_0_SYMBOL_PMPI_SEND ) && !defined(MPI_Send)\n\
             int PMPI_Send(const void* buf, int count, MPI_Datatype datatype, int dest, int tag, MPI_Comm comm);\n\
             /**\n * Measurement wrapper for MPI_Send in the C bindings.\n"
        ));
        assert!(code.contains("* @ingroup p2p\n* Default wrapper: Only enter and exit events are created.\n*/\n"));
        assert!(code.contains(
            "int MPI_Send(const void* buf, int count, MPI_Datatype datatype, int dest, int tag, MPI_Comm comm) {\n\
             SCOREP_IN_MEASUREMENT_INCREMENT();\n"
        ));
        assert!(code.contains("const int regionHandle = scorep_mpi_regions[ SCOREP_MPI_REGION__MPI_SEND ];\n"));
        assert!(code.contains(
            "const int event_gen_active_for_group = SCOREP_MPI_IS_EVENT_GEN_ON_FOR( SCOREP_MPI_ENABLED_P2P );\n"
        ));
        assert!(code.contains("return_value = PMPI_Send( buf, count, datatype, dest, tag, comm );\n"));
        assert!(code.ends_with("SCOREP_IN_MEASUREMENT_DECREMENT();\nreturn return_value;\n}\n#endif\n\n"));
    }

    #[test]
    fn test_send_task_lands_in_group_branch() {
        let mut w = CWrapper::new(mpi_send(), &options()).unwrap();
        w.attach(&tasks::TaskSend, Attributes::new()).unwrap();
        let code = generate(&w);

        let enter = code.find("SCOREP_EnterWrappedRegion(regionHandle);\n").unwrap();
        let send = code.find("SCOREP_MpiSend( dest, local_comm_handle, tag, local_send_bytes );").unwrap();
        let unwinding = code.find("} else if (SCOREP_IsUnwindingEnabled()) {\nSCOREP_EnterWrapper").unwrap();
        assert!(enter < send && send < unwinding);

        assert!(code.contains("uint64_t local_send_bytes = 0;\n"));
        assert!(code.contains(
            "const SCOREP_InterimCommunicatorHandle local_comm_handle = SCOREP_MPI_COMM_HANDLE(comm);\n"
        ));
        assert!(code.contains("PMPI_Type_size( datatype, &local_send_type_size );"));
    }

    #[test]
    fn test_recv_initializes_ignored_status() {
        let mut w = CWrapper::new(mpi_recv(), &options()).unwrap();
        w.attach(&tasks::TaskRecv, Attributes::new()).unwrap();
        let code = generate(&w);

        assert!(code.contains("int PMPI_Recv(void* buf, int count, MPI_Datatype datatype, int source, int tag, MPI_Comm comm, MPI_Status* status);\n"));
        assert!(code.contains("if ( status == MPI_STATUS_IGNORE )\n{\n    status = scorep_mpi_get_status_array(1);\n}\n"));
        assert!(code.contains("PMPI_Get_count(status, datatype, &local_recv_count);"));
        assert!(code.contains("SCOREP_MpiRecv( status->MPI_SOURCE, local_comm_handle, status->MPI_TAG, local_recv_bytes );"));
    }

    #[test]
    fn test_fake_finalization() {
        let finalize = ProcedureDescriptor::new("MPI_Finalize", Version::new(1, 0)).with_return_type("int");
        let opts = WrapperOptions {
            template: Template::FakeFinalizationWrapper,
            group: "env".to_string(),
            ..Default::default()
        };
        let w = CWrapper::new(finalize, &opts).unwrap();
        let code = generate(&w);

        assert!(code.contains("int PMPI_Finalize(void);\n"));
        assert!(code.contains(
            "SCOREP_ENTER_WRAPPED_REGION();\n/*\n * Fake finalization\n */\nreturn_value = PMPI_Barrier(MPI_COMM_WORLD);\n"
        ));
        assert!(code.contains("    mpi_finalize_called = true;\n"));
        assert!(!code.contains("PMPI_Finalize( "));
    }

    #[test]
    fn test_guard_compliance_and_guards() {
        let opts = WrapperOptions {
            template: Template::GuardComplianceWrapper,
            guards: vec!["p2p".to_string()],
            group: "p2p".to_string(),
            ..Default::default()
        };
        let w = CWrapper::new(mpi_send(), &opts).unwrap();
        let code = generate(&w);
        assert!(code.starts_with(
            "#if HAVE( MPI_SEND_COMPLIANT )\n#if HAVE( MPI_1_0_SYMBOL_PMPI_SEND ) && !defined(SCOREP_MPI_NO_P2P) && !defined(MPI_Send)\n"
        ));
        assert!(code.ends_with("#endif\n#endif\n\n"));
    }

    #[test]
    fn test_proto_args() {
        let opts = WrapperOptions {
            template: Template::ProtoArgsWrapper,
            group: "p2p".to_string(),
            c_variants: vec!["const".to_string()],
            ..Default::default()
        };
        let w = CWrapper::new(mpi_send(), &opts).unwrap();
        let code = generate(&w);
        assert!(code.starts_with("#if defined(SCOREP_MPI_SEND_PROTO_ARGS)\n"));
        assert!(code.contains("int PMPI_Send SCOREP_MPI_SEND_PROTO_ARGS;\n"));
        assert!(code.contains("int MPI_Send SCOREP_MPI_SEND_PROTO_ARGS\n{\n"));
    }

    #[test]
    fn test_proto_args_without_variants() {
        let mut opts = WrapperOptions {
            template: Template::ProtoArgsWrapper,
            ..Default::default()
        };
        assert!(CWrapper::new(mpi_send(), &opts).is_ok());
        opts.strict = true;
        let err = CWrapper::new(mpi_send(), &opts).unwrap_err();
        assert!(err.to_string().contains("c_variants"));
    }

    #[test]
    fn test_missing_return_type_is_an_error() {
        let p = ProcedureDescriptor::new("MPI_Wtime", Version::new(1, 0));
        assert!(CWrapper::new(p, &options()).is_err());
    }

    #[test]
    fn test_debug_comments() {
        let opts = WrapperOptions {
            debug: true,
            ..options()
        };
        let mut w = CWrapper::new(mpi_send(), &opts).unwrap();
        w.attach(&tasks::TaskTodo, Attributes::new().with("message", json!("check tags")))
            .unwrap();
        let code = generate(&w);
        assert!(code.contains("// Hook 'comment' enter\n"));
        assert!(code.contains("// 'TaskTodo' enter hook\n* TODO: check tags\n// 'TaskTodo': exit hook\n"));
        assert!(code.contains("// Hook 'comment' post\n*/\n"));
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(
            CWrapper::placeholder("MPI_Send", "unsupported"),
            "/*\n * WARNING: No wrapper generated for MPI_Send: unsupported\n */\n"
        );
    }
}
