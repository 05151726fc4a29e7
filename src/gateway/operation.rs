//! Operation descriptors.
//!
//! Every inbound route is described by one [`Operation`]: where it is
//! mounted, which upstream endpoint it targets, which fields it requires,
//! how its payload is shaped and how the upstream reply is rendered. The
//! descriptors are plain `'static` data so the whole route table can be
//! inspected and unit tested without a transport.

/// HTTP verb of an inbound route and of its upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }
}

/// Which of the two upstream APIs an operation talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// Locators, entries, appointments and login.
    Data,
    /// Products and product images.
    Catalog,
}

impl Upstream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Upstream::Data => "data",
            Upstream::Catalog => "catalog",
        }
    }
}

/// Where a value is read from in the inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Captured path parameter.
    Path(&'static str),
    /// Query string parameter.
    Query(&'static str),
    /// Top-level JSON body field.
    Body(&'static str),
    /// Field inside a JSON body envelope object: `Nested(envelope, field)`.
    Nested(&'static str, &'static str),
}

/// How strictly a required field is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present, not `null` and not the empty string.
    NonEmpty,
    /// Must be present; any value (including `false`, `0`, `null`) passes.
    Defined,
}

/// A field that must be supplied before the upstream is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub source: Source,
    pub presence: Presence,
}

const fn need(source: Source) -> Requirement {
    Requirement { source, presence: Presence::NonEmpty }
}

/// Value of one field in a reshaped JSON payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Copy a top-level body field; omitted when the caller did not send it.
    Body(&'static str),
    /// Copy a body field, substituting the default when absent or empty.
    BodyOr(&'static str, &'static str),
    /// Fixed value regardless of input.
    Const(&'static str),
}

/// One entry of a mapping table: `target` receives `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub target: &'static str,
    pub value: FieldValue,
}

const fn copy(name: &'static str) -> FieldMap {
    FieldMap { target: name, value: FieldValue::Body(name) }
}

const fn rename(from: &'static str, to: &'static str) -> FieldMap {
    FieldMap { target: to, value: FieldValue::Body(from) }
}

const fn or(name: &'static str, default: &'static str) -> FieldMap {
    FieldMap { target: name, value: FieldValue::BodyOr(name, default) }
}

const fn fixed(name: &'static str, value: &'static str) -> FieldMap {
    FieldMap { target: name, value: FieldValue::Const(value) }
}

/// Outbound payload rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// No request body (GET operations).
    Empty,
    /// Table-driven JSON object, optionally wrapped under an envelope key.
    Fields {
        envelope: Option<&'static str>,
        fields: &'static [FieldMap],
    },
    /// Forward the caller's envelope object unchanged.
    Forward { envelope: &'static str },
    /// Forward the caller's entry envelope with its date normalized to
    /// `MM/DD/YYYY` and its time replaced by the current wall-clock time.
    StampedEntry { envelope: &'static str },
    /// Raw binary attachment (image upload).
    Attachment,
}

/// How a successful upstream reply is rendered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Status and body verbatim.
    PassThrough,
    /// Synthesized entry summary built from the stamped envelope and the
    /// upstream-assigned `EntradaId`.
    EntrySummary,
    /// Return one field of the upstream body, or `404` when it is missing.
    Unwrap {
        field: &'static str,
        not_found: &'static str,
    },
}

/// Static description of one gateway operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Stable name used in logs and metrics.
    pub name: &'static str,
    pub verb: Verb,
    /// Inbound axum route.
    pub route: &'static str,
    pub upstream: Upstream,
    /// Upstream path; `{name}` segments are filled from path parameters.
    pub target: &'static str,
    /// Upstream query parameters: `(upstream name, source)`. Absent values
    /// are left out of the query string.
    pub query: &'static [(&'static str, Source)],
    pub required: &'static [Requirement],
    pub payload: Payload,
    pub reply: Reply,
}

const LOCATARIO_CREATE_FIELDS: &[FieldMap] = &[
    copy("LocatarioNombre"),
    copy("LocatarioDireccion"),
    fixed("LocatarioEmail", ""),
    fixed("UsuId", "0"),
    copy("LocatarioTelefono"),
    copy("LocatarioTel2"),
    copy("LocatarioRFC"),
    copy("LocatarioNomContacto"),
    copy("LocatarioTelContacto"),
    fixed("LocatarioActivo", "S"),
    or("LocatarioObservacion", ""),
    copy("UsuCuenta"),
    copy("UsuPassword"),
];

const LOCATARIO_UPDATE_FIELDS: &[FieldMap] = &[
    copy("LocatarioId"),
    copy("LocatarioNombre"),
    copy("LocatarioDireccion"),
    copy("LocatarioEmail"),
    copy("UsuId"),
    copy("LocatarioTelefono"),
    or("LocatarioTel2", ""),
    copy("LocatarioRFC"),
    copy("LocatarioNomContacto"),
    copy("LocatarioTelContacto"),
    or("LocatarioActivo", "S"),
    or("LocatarioObservacion", ""),
];

// Creation fans the single inbound price out to all three tiers; update
// forwards the tiers independently.
const PRODUCTO_CREATE_FIELDS: &[FieldMap] = &[
    fixed("ProdId", ""),
    copy("LocatarioId"),
    copy("ProdsSKU"),
    copy("ProdsDescrip"),
    copy("ProdsLinea"),
    copy("ProdsFamilia"),
    copy("ProdsCosto"),
    copy("ProdsPrecio1"),
    rename("ProdsPrecio1", "ProdsPrecio2"),
    rename("ProdsPrecio1", "ProdsPrecio3"),
    copy("ProdsChek1"),
    copy("ProdsObserv"),
    copy("ProdsExistencia"),
];

const PRODUCTO_UPDATE_FIELDS: &[FieldMap] = &[
    copy("ProdId"),
    copy("LocatarioId"),
    copy("ProdsSKU"),
    copy("ProdsDescrip"),
    copy("ProdsLinea"),
    copy("ProdsFamilia"),
    copy("ProdsCosto"),
    copy("ProdsPrecio1"),
    copy("ProdsPrecio2"),
    copy("ProdsPrecio3"),
    copy("ProdsChek1"),
    copy("ProdsObserv"),
    copy("ProdsExistencia"),
];

/// Every operation the gateway exposes.
pub static OPERATIONS: &[Operation] = &[
    Operation {
        name: "login",
        verb: Verb::Post,
        route: "/api/login",
        upstream: Upstream::Data,
        target: "/Login",
        query: &[],
        required: &[],
        payload: Payload::Fields {
            envelope: None,
            fields: &[copy("Cuenta"), copy("Password")],
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "get_locatario",
        verb: Verb::Get,
        route: "/api/locatario/{id}",
        upstream: Upstream::Data,
        target: "/Locatario/{id}",
        query: &[],
        required: &[need(Source::Path("id"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "search_locatario",
        verb: Verb::Get,
        route: "/api/buscar-locatario",
        upstream: Upstream::Data,
        target: "/BusquedaLocatario",
        query: &[("Nombre", Source::Query("nombre"))],
        required: &[need(Source::Query("nombre"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "create_locatario",
        verb: Verb::Post,
        route: "/api/locatario",
        upstream: Upstream::Data,
        target: "/CrearLocatario",
        query: &[],
        required: &[],
        payload: Payload::Fields {
            envelope: Some("SDTCuentaLocatario"),
            fields: LOCATARIO_CREATE_FIELDS,
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "update_locatario",
        verb: Verb::Post,
        route: "/api/actualizar-locatario",
        upstream: Upstream::Data,
        target: "/ActualizarLocatario",
        query: &[],
        required: &[need(Source::Body("LocatarioId"))],
        payload: Payload::Fields {
            envelope: None,
            fields: LOCATARIO_UPDATE_FIELDS,
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "list_productos",
        verb: Verb::Get,
        route: "/productos",
        upstream: Upstream::Catalog,
        target: "/Productos",
        query: &[("LocatarioId", Source::Query("LocatarioId"))],
        required: &[],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "find_producto",
        verb: Verb::Get,
        route: "/api/buscar-producto",
        upstream: Upstream::Catalog,
        target: "/BuscaProd",
        query: &[
            ("Locatarioid", Source::Query("Locatarioid")),
            ("Prodssku", Source::Query("Prodssku")),
        ],
        required: &[need(Source::Query("Locatarioid")), need(Source::Query("Prodssku"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "create_producto",
        verb: Verb::Post,
        route: "/api/crear-producto",
        upstream: Upstream::Catalog,
        target: "/CrearProd",
        query: &[],
        required: &[],
        payload: Payload::Fields {
            envelope: Some("SDTProd"),
            fields: PRODUCTO_CREATE_FIELDS,
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "delete_producto",
        verb: Verb::Get,
        route: "/api/eliminar-producto",
        upstream: Upstream::Catalog,
        target: "/EliminaProd",
        query: &[
            ("Locatarioid", Source::Query("Locatarioid")),
            ("Prodssku", Source::Query("Prodssku")),
        ],
        required: &[need(Source::Query("Locatarioid")), need(Source::Query("Prodssku"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "update_producto",
        verb: Verb::Post,
        route: "/api/actualizar-producto",
        upstream: Upstream::Catalog,
        target: "/ActualizaProd",
        query: &[],
        required: &[],
        payload: Payload::Fields {
            envelope: Some("SDTProd"),
            fields: PRODUCTO_UPDATE_FIELDS,
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "search_productos",
        verb: Verb::Get,
        route: "/api/buscar-productos",
        upstream: Upstream::Catalog,
        target: "/BuscaProductos",
        query: &[
            ("Locatarioid", Source::Query("Locatarioid")),
            ("Prodsdescrip", Source::Query("Prodsdescrip")),
        ],
        required: &[need(Source::Query("Locatarioid")), need(Source::Query("Prodsdescrip"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "create_part_entrada",
        verb: Verb::Post,
        route: "/api/crear-part-entrada",
        upstream: Upstream::Data,
        target: "/CrearPartEntrada",
        query: &[],
        required: &[],
        payload: Payload::Fields {
            envelope: Some("SDTPartEntrada"),
            fields: &[
                copy("EntradaId"),
                copy("PartEntProdId"),
                copy("PartEntCant"),
                copy("PartEntCheck"),
                copy("PartEntObserv"),
            ],
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "create_entrada",
        verb: Verb::Post,
        route: "/api/crear-entrada",
        upstream: Upstream::Data,
        target: "/CrearEntrada",
        query: &[],
        required: &[
            need(Source::Body("SDTEntrada")),
            need(Source::Nested("SDTEntrada", "LocatarioId")),
            need(Source::Nested("SDTEntrada", "EntradaFechaCap")),
            need(Source::Nested("SDTEntrada", "EntradaObserv")),
        ],
        payload: Payload::StampedEntry { envelope: "SDTEntrada" },
        reply: Reply::EntrySummary,
    },
    Operation {
        name: "delete_entrada",
        verb: Verb::Get,
        route: "/api/eliminar-entrada",
        upstream: Upstream::Data,
        target: "/EliminaEntrada",
        query: &[
            ("Entradaid", Source::Query("Entradaid")),
            ("PartEntId", Source::Query("PartEntId")),
        ],
        required: &[need(Source::Query("Entradaid")), need(Source::Query("PartEntId"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "get_entrada",
        verb: Verb::Get,
        route: "/api/entrada/{id}",
        upstream: Upstream::Data,
        target: "/Entrada/{id}",
        query: &[],
        required: &[need(Source::Path("id"))],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "pending_entradas",
        verb: Verb::Get,
        route: "/api/entradas-pendientes",
        upstream: Upstream::Data,
        target: "/EntradasPendientes",
        query: &[],
        required: &[],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "create_cita",
        verb: Verb::Post,
        route: "/api/crear-cita",
        upstream: Upstream::Data,
        target: "/CrearCita",
        query: &[],
        required: &[
            need(Source::Body("SDTGeneraCita")),
            need(Source::Nested("SDTGeneraCita", "LocatarioId")),
            need(Source::Nested("SDTGeneraCita", "CitaFecha")),
            need(Source::Nested("SDTGeneraCita", "CitaHoraInicio")),
            need(Source::Nested("SDTGeneraCita", "CitaHoraFin")),
        ],
        payload: Payload::Forward { envelope: "SDTGeneraCita" },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "confirmed_entradas",
        verb: Verb::Get,
        route: "/api/entradas-confirmadas",
        upstream: Upstream::Data,
        target: "/EntradasConfirmadas",
        query: &[],
        required: &[],
        payload: Payload::Empty,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "update_part_check",
        verb: Verb::Post,
        route: "/api/actualizar-check-partida",
        upstream: Upstream::Data,
        target: "/ActualizaCheckPartE",
        query: &[],
        required: &[
            need(Source::Body("EntradaId")),
            need(Source::Body("PartEntId")),
            Requirement {
                source: Source::Body("partEntCheck"),
                presence: Presence::Defined,
            },
        ],
        payload: Payload::Fields {
            envelope: None,
            fields: &[copy("EntradaId"), copy("PartEntId"), copy("partEntCheck")],
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "update_part_observ",
        verb: Verb::Post,
        route: "/api/actualizar-observaciones-partida",
        upstream: Upstream::Data,
        target: "/ActualizaObservPartE",
        query: &[],
        required: &[
            need(Source::Body("EntradaId")),
            need(Source::Body("PartEntId")),
            need(Source::Body("PartEntObserv")),
        ],
        payload: Payload::Fields {
            envelope: None,
            fields: &[copy("EntradaId"), copy("PartEntId"), copy("PartEntObserv")],
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "upload_imagen",
        verb: Verb::Post,
        route: "/api/subir-imagen",
        upstream: Upstream::Catalog,
        target: "/gxobject",
        query: &[],
        required: &[],
        payload: Payload::Attachment,
        reply: Reply::PassThrough,
    },
    Operation {
        name: "link_imagen_producto",
        verb: Verb::Post,
        route: "/api/asociar-imagen-producto",
        upstream: Upstream::Catalog,
        target: "/EnlazaImagenProd",
        query: &[],
        required: &[need(Source::Body("ProdId")), need(Source::Body("FileImage"))],
        payload: Payload::Fields {
            envelope: None,
            fields: &[copy("ProdId"), copy("FileImage")],
        },
        reply: Reply::PassThrough,
    },
    Operation {
        name: "list_imagenes_producto",
        verb: Verb::Get,
        route: "/api/imagenes-producto/{prodId}",
        upstream: Upstream::Catalog,
        target: "/Imagenes/{prodId}",
        query: &[],
        required: &[need(Source::Path("prodId"))],
        payload: Payload::Empty,
        reply: Reply::Unwrap {
            field: "SDTImagenProd",
            not_found: "no images found for the given product",
        },
    },
];

/// Look up an operation by name.
pub fn find(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_and_routes_are_unique() {
        let names: HashSet<_> = OPERATIONS.iter().map(|op| op.name).collect();
        let routes: HashSet<_> = OPERATIONS.iter().map(|op| op.route).collect();
        assert_eq!(names.len(), OPERATIONS.len());
        assert_eq!(routes.len(), OPERATIONS.len());
        assert_eq!(OPERATIONS.len(), 23);
    }

    #[test]
    fn test_target_placeholders_have_matching_route_params() {
        for op in OPERATIONS {
            for segment in op.target.split('/') {
                if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    assert!(
                        op.route.contains(&format!("{{{}}}", name)),
                        "{} targets {{{}}} but its route does not capture it",
                        op.name,
                        name
                    );
                }
            }
        }
    }

    #[test]
    fn test_get_operations_carry_no_body() {
        for op in OPERATIONS.iter().filter(|op| op.verb == Verb::Get) {
            assert_eq!(op.payload, Payload::Empty, "{}", op.name);
        }
    }

    #[test]
    fn test_find_by_name() {
        assert_eq!(find("create_entrada").map(|op| op.target), Some("/CrearEntrada"));
        assert!(find("nope").is_none());
    }
}
