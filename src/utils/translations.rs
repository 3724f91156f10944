//! Traducciones centralizadas (inglés / árabe)
//!
//! Todos los mensajes visibles para el usuario se construyen aquí para que
//! cada respuesta lleve su versión en inglés y en árabe.

use serde::Serialize;

/// Mensaje bilingüe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Localized {
    pub en: String,
    pub ar: String,
}

impl Localized {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }
}

/// Nombre de un modelo en ambos idiomas (singular y plural)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelName {
    pub en: &'static str,
    pub ar: &'static str,
    pub plural_en: &'static str,
    pub plural_ar: &'static str,
}

impl ModelName {
    pub const fn new(
        en: &'static str,
        ar: &'static str,
        plural_en: &'static str,
        plural_ar: &'static str,
    ) -> Self {
        Self {
            en,
            ar,
            plural_en,
            plural_ar,
        }
    }

    pub fn label(&self) -> Localized {
        Localized::new(self.en, self.ar)
    }

    pub fn plural_label(&self) -> Localized {
        Localized::new(self.plural_en, self.plural_ar)
    }
}

pub const CAR: ModelName = ModelName::new("Car", "سيارة", "Cars", "السيارات");
pub const EQUIPMENT: ModelName = ModelName::new("Equipment", "معدة", "Equipment", "المعدات");
pub const MAINTENANCE: ModelName =
    ModelName::new("Maintenance record", "صيانة", "Maintenance records", "سجلات الصيانة");
pub const ATTACHMENT: ModelName = ModelName::new("Attachment", "مرفق", "Attachments", "المرفقات");
pub const CALIBRATION_CERTIFICATE: ModelName = ModelName::new(
    "Calibration certificate",
    "شهادة معايرة",
    "Calibration certificates",
    "شهادات المعايرة",
);
pub const USER: ModelName = ModelName::new("User", "مستخدم", "Users", "المستخدمين");
pub const PERMISSIONS: ModelName = ModelName::new("Permissions", "صلاحيات", "Permissions", "الصلاحيات");
pub const MEDIA_FILE: ModelName = ModelName::new("File", "ملف", "Files", "الملفات");

/// Operaciones que aparecen en los mensajes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Restore,
    Upload,
}

impl Operation {
    pub fn ar(&self) -> &'static str {
        match self {
            Operation::Create => "إنشاء",
            Operation::Update => "تحديث",
            Operation::Delete => "حذف",
            Operation::Restore => "استعادة",
            Operation::Upload => "رفع",
        }
    }

    fn en_past(&self) -> &'static str {
        match self {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
            Operation::Restore => "restored",
            Operation::Upload => "uploaded",
        }
    }

    fn en_progressive(&self) -> &'static str {
        match self {
            Operation::Create => "creating",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
            Operation::Restore => "restoring",
            Operation::Upload => "uploading",
        }
    }
}

/// "تم {operation} {model} بنجاح!"
pub fn success(operation: Operation, model: ModelName) -> Localized {
    Localized::new(
        format!("{} {} successfully!", model.en, operation.en_past()),
        format!("تم {} {} بنجاح!", operation.ar(), model.ar),
    )
}

/// "حدث خطأ أثناء {operation} {model}"
pub fn operation_error(operation: Operation, model: ModelName) -> Localized {
    Localized::new(
        format!(
            "An error occurred while {} {}",
            operation.en_progressive(),
            model.en.to_lowercase()
        ),
        format!("حدث خطأ أثناء {} {}", operation.ar(), model.ar),
    )
}

pub fn not_found(model: ModelName) -> Localized {
    Localized::new(
        format!("{} not found", model.en),
        format!("لم يتم العثور على {}", model.ar),
    )
}

pub fn validation_failed() -> Localized {
    Localized::new("Please correct the errors below", "يرجى تصحيح الأخطاء أدناه")
}

pub fn field_required() -> Localized {
    Localized::new("This field is required.", "هذا الحقل مطلوب.")
}

pub fn already_exists(field: &str) -> Localized {
    let label = field_label(field);
    Localized::new(
        format!("{} already exists", label.en),
        format!("{} موجود مسبقاً", label.ar),
    )
}

pub fn protected_delete() -> Localized {
    Localized::new(
        "This item cannot be deleted because it is linked to other records",
        "لا يمكن حذف هذا العنصر لأنه مرتبط بعناصر أخرى في النظام",
    )
}

pub fn integrity_conflict() -> Localized {
    Localized::new(
        "Database error - the data may be conflicting",
        "خطأ في قاعدة البيانات - قد يكون هناك تضارب في البيانات",
    )
}

pub fn permission_denied() -> Localized {
    Localized::new(
        "You do not have permission to access this page",
        "ليس لديك صلاحية للوصول إلى هذه الصفحة",
    )
}

pub fn admin_required() -> Localized {
    Localized::new(
        "Administrator privileges are required",
        "يتطلب هذا الإجراء صلاحيات المدير",
    )
}

pub fn bad_request() -> Localized {
    Localized::new("Invalid request", "طلب غير صالح")
}

pub fn server_error() -> Localized {
    Localized::new("A server error occurred", "حدث خطأ في الخادم")
}

pub fn database_error() -> Localized {
    Localized::new("Database error", "خطأ في قاعدة البيانات")
}

pub fn login_required() -> Localized {
    Localized::new("Authentication is required", "يجب تسجيل الدخول أولاً")
}

pub fn invalid_token() -> Localized {
    Localized::new("Invalid or expired token", "رمز الدخول غير صالح أو منتهي الصلاحية")
}

pub fn invalid_credentials() -> Localized {
    Localized::new(
        "Invalid username or password",
        "اسم المستخدم أو كلمة المرور غير صحيحة",
    )
}

pub fn account_disabled() -> Localized {
    Localized::new(
        "You are not allowed to access this system.",
        "ليس لديك صلاحية للدخول إلى هذا النظام.",
    )
}

pub fn too_many_attempts() -> Localized {
    Localized::new(
        "Too many requests. Please try again later",
        "عدد كبير من المحاولات، يرجى المحاولة لاحقاً",
    )
}

pub fn logged_in() -> Localized {
    Localized::new("Logged in successfully", "تم تسجيل الدخول بنجاح")
}

pub fn logged_out() -> Localized {
    Localized::new("Logged out successfully", "تم تسجيل الخروج بنجاح")
}

pub fn unknown_search_field(field: &str) -> Localized {
    Localized::new(
        format!("Unknown search field '{}'", field),
        format!("حقل البحث '{}' غير معروف", field),
    )
}

pub fn unknown_lookup_table(key: &str) -> Localized {
    Localized::new(
        format!("Unknown lookup table '{}'", key),
        format!("الجدول '{}' غير موجود", key),
    )
}

pub fn user_saved(operation: Operation, username: &str) -> Localized {
    Localized::new(
        format!("User \"{}\" {} successfully.", username, operation.en_past()),
        format!("تم {} المستخدم \"{}\" بنجاح.", operation.ar(), username),
    )
}

pub fn permissions_updated(username: &str) -> Localized {
    Localized::new(
        format!("Permissions of user \"{}\" updated successfully.", username),
        format!("تم تحديث صلاحيات المستخدم \"{}\" بنجاح.", username),
    )
}

pub fn purge_requires_confirmation() -> Localized {
    Localized::new(
        "Permanent deletion requires confirm=true",
        "الحذف النهائي يتطلب التأكيد",
    )
}

pub fn purge_requires_soft_delete() -> Localized {
    Localized::new(
        "Only records that were already deleted can be permanently removed",
        "لا يمكن الحذف النهائي إلا للسجلات المحذوفة مسبقاً",
    )
}

/// Etiqueta de un campo de formulario en ambos idiomas
pub fn field_label(field: &str) -> Localized {
    let (en, ar) = match field {
        "fleet_no" => ("Fleet number", "رقم الأسطول"),
        "plate_no_en" => ("Plate number (English)", "رقم اللوحة (الإنجليزية)"),
        "plate_no_ar" => ("Plate number (Arabic)", "رقم اللوحة (العربية)"),
        "plate_no" => ("Plate number", "رقم اللوحة"),
        "door_no" => ("Door number", "رقم الباب"),
        "manufacture_year" => ("Manufacture year", "سنة التصنيع"),
        "location_description" => ("Location description", "وصف الموقع"),
        "address_details" => ("Address details", "تفاصيل العنوان"),
        "ownership_type" => ("Ownership type", "نوع الملكية"),
        "status" => ("Status", "الحالة"),
        "license_records" => ("License records", "سجلات الترخيص"),
        "inspection_records" => ("Inspection records", "سجلات الفحص"),
        "fire_extinguisher_records" => ("Fire extinguisher records", "سجلات طفاية الحريق"),
        "start_date" => ("Start date", "تاريخ البداية"),
        "end_date" => ("End date", "تاريخ الانتهاء"),
        "maintenance_date" => ("Maintenance date", "تاريخ الصيانة"),
        "restoration_date" => ("Restoration date", "تاريخ الاستعادة"),
        "cost" => ("Cost", "التكلفة"),
        "description" => ("Description", "الوصف"),
        "name_en" => ("Name (English)", "الاسم (الإنجليزية)"),
        "name_ar" => ("Name (Arabic)", "الاسم (العربية)"),
        "parent_id" => ("Parent", "العنصر الأب"),
        "attributes" => ("Attributes", "الخصائص"),
        "username" => ("Username", "اسم المستخدم"),
        "email" => ("Email", "البريد الإلكتروني"),
        "password" => ("Password", "كلمة المرور"),
        "first_name" => ("First name", "الاسم الأول"),
        "last_name" => ("Last name", "اسم العائلة"),
        "user_type" => ("User type", "نوع المستخدم"),
        "files" => ("Files", "الملفات"),
        "visited_regions" => ("Visited regions", "المناطق المزارة"),
        other => return Localized::new(other, other),
    };
    Localized::new(en, ar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_message_uses_arabic_template() {
        let message = success(Operation::Create, CAR);
        assert_eq!(message.ar, "تم إنشاء سيارة بنجاح!");
        assert_eq!(message.en, "Car created successfully!");
    }

    #[test]
    fn test_not_found_and_error_templates() {
        assert_eq!(not_found(EQUIPMENT).ar, "لم يتم العثور على معدة");
        assert_eq!(
            operation_error(Operation::Delete, MAINTENANCE).ar,
            "حدث خطأ أثناء حذف صيانة"
        );
    }

    #[test]
    fn test_unknown_field_label_falls_back_to_key() {
        let label = field_label("mystery");
        assert_eq!(label.en, "mystery");
        assert_eq!(label.ar, "mystery");
        assert_eq!(already_exists("fleet_no").ar, "رقم الأسطول موجود مسبقاً");
    }
}
